//! The field table: which patterns feed each column and how their
//! occurrences become one value.

use crate::error::{ExtractError, MalformedRecord, fields};
use crate::mapper::config::MapperConfig;
use crate::pattern::{ExtractedField, FieldPattern};
use crate::row::Column;
use itertools::Itertools;

/// How the occurrences of a column's pattern(s) become the column value.
#[derive(Debug, Clone)]
pub(crate) enum Rule {
    /// First occurrence of the first pattern that yields a non-empty value.
    First(Vec<FieldPattern>),
    /// Every occurrence, as a list or collapsed into a scalar.
    Every(FieldPattern),
    /// Abstract sections, captured as (label, text) pairs.
    Sections(FieldPattern),
}

#[derive(Debug, Clone)]
pub(crate) struct FieldRule {
    pub(crate) column: Column,
    pub(crate) rule: Rule,
}

impl FieldRule {
    fn new(column: Column, rule: Rule) -> Self {
        Self { column, rule }
    }

    /// Apply the rule to one record.
    pub(crate) fn apply(
        &self,
        text: &str,
        config: &MapperConfig,
    ) -> Result<ExtractedField, MalformedRecord> {
        match &self.rule {
            Rule::First(patterns) => first_non_empty(patterns, text),
            Rule::Every(pattern) => pattern.try_extract(text),
            Rule::Sections(pattern) => {
                let sections = pattern.occurrence_groups(text)?;
                Ok(ExtractedField::Scalar(join_sections(sections, config)))
            }
        }
    }
}

fn first_non_empty(
    patterns: &[FieldPattern],
    text: &str,
) -> Result<ExtractedField, MalformedRecord> {
    let mut failure = None;
    for pattern in patterns {
        match pattern.occurrences(text) {
            Ok(values) => {
                if let Some(value) = values.into_iter().next().filter(|v| !v.is_empty()) {
                    return Ok(ExtractedField::Scalar(value));
                }
            }
            Err(error) => {
                failure.get_or_insert(error);
            }
        }
    }
    match failure {
        Some(error) => Err(error),
        None => Ok(ExtractedField::Scalar(String::new())),
    }
}

/// A single section is used as is; several become "Label: Text" segments.
fn join_sections(sections: Vec<Vec<String>>, config: &MapperConfig) -> String {
    let mut sections = sections.into_iter().map(|groups| {
        let mut groups = groups.into_iter();
        let label = groups.next().unwrap_or_default();
        let text = groups.next().unwrap_or_default();
        (label, text)
    });
    match sections.len() {
        0 => String::new(),
        1 => sections.next().map(|(_, text)| text).unwrap_or_default(),
        _ => sections
            .map(|(label, text)| {
                if label.is_empty() {
                    text
                } else {
                    format!("{}{}{}", label, config.section_label_separator, text)
                }
            })
            .join(&config.section_break),
    }
}

/// Build the built-in field table for `config`.
pub(crate) fn field_table(config: &MapperConfig) -> Result<Vec<FieldRule>, ExtractError> {
    use Column::*;

    Ok(vec![
        FieldRule::new(
            Pmid,
            Rule::First(vec![
                FieldPattern::new(fields::PMID, r"<PMID\b[^>]*>\s*(\d+)\s*</PMID>")?,
                FieldPattern::new(
                    fields::PMID,
                    r#"(?s)<ArticleId\b[^>]*\bIdType="pubmed"[^>]*>\s*(.*?)\s*</ArticleId>"#,
                )?
                .scoped_to_tag("ArticleIdList")?,
            ]),
        ),
        FieldRule::new(
            Title,
            Rule::First(vec![
                FieldPattern::tag(fields::TITLE, "ArticleTitle")?,
                FieldPattern::tag(fields::TITLE, "BookTitle")?,
            ]),
        ),
        FieldRule::new(
            Journal,
            Rule::First(vec![
                FieldPattern::tag(fields::JOURNAL, "Title")?.scoped_to_tag("Journal")?,
            ]),
        ),
        FieldRule::new(
            JournalAbbr,
            Rule::First(vec![
                FieldPattern::tag(fields::JOURNAL_ABBR, "ISOAbbreviation")?
                    .scoped_to_tag("Journal")?,
                FieldPattern::tag(fields::JOURNAL_ABBR, "MedlineTA")?,
            ]),
        ),
        FieldRule::new(
            Year,
            Rule::First(vec![
                FieldPattern::new(fields::YEAR, r"<Year>\s*(\d{4})\s*</Year>")?
                    .scoped_to_tag("PubDate")?,
                FieldPattern::new(fields::YEAR, r"<MedlineDate>\s*(\d{4})")?
                    .scoped_to_tag("PubDate")?,
            ]),
        ),
        FieldRule::new(
            Month,
            Rule::First(vec![
                FieldPattern::tag(fields::MONTH, "Month")?.scoped_to_tag("PubDate")?,
            ]),
        ),
        FieldRule::new(
            Volume,
            Rule::First(vec![FieldPattern::tag(fields::VOLUME, "Volume")?]),
        ),
        FieldRule::new(
            Issue,
            Rule::First(vec![FieldPattern::tag(fields::ISSUE, "Issue")?]),
        ),
        FieldRule::new(
            Pages,
            Rule::First(vec![FieldPattern::tag(fields::PAGES, "MedlinePgn")?]),
        ),
        FieldRule::new(
            StartPage,
            Rule::First(vec![FieldPattern::tag(fields::START_PAGE, "StartPage")?]),
        ),
        FieldRule::new(
            EndPage,
            Rule::First(vec![FieldPattern::tag(fields::END_PAGE, "EndPage")?]),
        ),
        FieldRule::new(
            Doi,
            Rule::First(vec![
                FieldPattern::new(
                    fields::DOI,
                    r#"(?s)<ELocationID\b[^>]*\bEIdType="doi"[^>]*>\s*(.*?)\s*</ELocationID>"#,
                )?,
                FieldPattern::new(
                    fields::DOI,
                    r#"(?s)<ArticleId\b[^>]*\bIdType="doi"[^>]*>\s*(.*?)\s*</ArticleId>"#,
                )?
                .scoped_to_tag("ArticleIdList")?,
            ]),
        ),
        FieldRule::new(
            PmcId,
            Rule::First(vec![
                FieldPattern::new(
                    fields::PMC_ID,
                    r#"(?s)<ArticleId\b[^>]*\bIdType="pmc"[^>]*>\s*(.*?)\s*</ArticleId>"#,
                )?
                .scoped_to_tag("ArticleIdList")?,
            ]),
        ),
        FieldRule::new(
            Language,
            Rule::First(vec![FieldPattern::tag(fields::LANGUAGE, "Language")?]),
        ),
        FieldRule::new(Issn, Rule::Every(FieldPattern::tag(fields::ISSN, "ISSN")?)),
        FieldRule::new(
            Authors,
            Rule::Every(
                FieldPattern::new(
                    fields::AUTHORS,
                    r#"<Author\b[^>]*\bValidYN="Y"[^>]*>\s*<LastName>([^<]*)</LastName>\s*<ForeName>([^<]*)</ForeName>"#,
                )?
                .with_group_order(&[2, 1])?
                .scoped_to_tag("AuthorList")?
                .collapsed(config.author_separator.as_str()),
            ),
        ),
        FieldRule::new(
            Abstract,
            Rule::Sections(
                FieldPattern::new(
                    fields::ABSTRACT,
                    r#"(?s)<AbstractText\b(?:[^>]*?\bLabel="([^"]*)")?[^>]*>(.*?)</AbstractText>"#,
                )?
                .scoped_to_tag("Abstract")?,
            ),
        ),
        FieldRule::new(
            MeshHeadings,
            Rule::Every(
                FieldPattern::new(
                    fields::MESH_HEADINGS,
                    r"(?s)<MeshHeading\b[^>]*>\s*<DescriptorName\b[^>]*>(.*?)</DescriptorName>(.*?)</MeshHeading>",
                )?
                .with_nested(r"(?s)<QualifierName\b[^>]*>(.*?)</QualifierName>")?
                .with_nested_separator(config.qualifier_separator.as_str())
                .scoped_to_tag("MeshHeadingList")?,
            ),
        ),
        FieldRule::new(
            MajorTopics,
            Rule::Every(FieldPattern::new(
                fields::MAJOR_TOPICS,
                r#"(?s)<(?:DescriptorName|QualifierName|Keyword)\b[^>]*\bMajorTopicYN="Y"[^>]*>(.*?)</(?:DescriptorName|QualifierName|Keyword)>"#,
            )?),
        ),
        FieldRule::new(
            Keywords,
            Rule::Every(FieldPattern::tag(fields::KEYWORDS, "Keyword")?),
        ),
        FieldRule::new(
            PublicationTypes,
            Rule::Every(
                FieldPattern::tag(fields::PUBLICATION_TYPES, "PublicationType")?
                    .scoped_to_tag("PublicationTypeList")?,
            ),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn rule_for(column: Column) -> FieldRule {
        field_table(&MapperConfig::new())
            .unwrap()
            .into_iter()
            .find(|r| r.column == column)
            .unwrap()
    }

    fn apply(column: Column, text: &str) -> ExtractedField {
        rule_for(column).apply(text, &MapperConfig::new()).unwrap()
    }

    fn scalar(s: &str) -> ExtractedField {
        ExtractedField::Scalar(s.to_string())
    }

    #[test]
    fn test_table_covers_every_column_once() {
        let table = field_table(&MapperConfig::new()).unwrap();
        let columns: Vec<Column> = table.iter().map(|r| r.column).collect();
        assert_eq!(columns, Column::ALL.to_vec());
    }

    #[rstest]
    #[case(r#"<ELocationID EIdType="pii" ValidYN="Y">S0140</ELocationID><ELocationID EIdType="doi" ValidYN="Y">10.1000/xyz</ELocationID>"#, "10.1000/xyz")]
    #[case(r#"<ELocationID EIdType="pii">S0140</ELocationID>"#, "")]
    #[case(r#"<ArticleIdList><ArticleId IdType="pubmed">1</ArticleId><ArticleId IdType="doi">10.2/abc</ArticleId></ArticleIdList>"#, "10.2/abc")]
    #[case(r#"<ELocationID EIdType="doi">10.1/first</ELocationID><ArticleIdList><ArticleId IdType="doi">10.2/second</ArticleId></ArticleIdList>"#, "10.1/first")]
    fn test_doi(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(apply(Column::Doi, text), scalar(expected));
    }

    #[rstest]
    #[case(r#"<PMID Version="1">31181385</PMID><CommentsCorrections><PMID Version="1">1</PMID></CommentsCorrections>"#, "31181385")]
    #[case(r#"<ArticleIdList><ArticleId IdType="pubmed">42</ArticleId></ArticleIdList>"#, "42")]
    #[case("<Article>no identifiers</Article>", "")]
    fn test_pmid(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(apply(Column::Pmid, text), scalar(expected));
    }

    #[rstest]
    #[case("<PubDate><Year>2019</Year><Month>Dec</Month></PubDate>", "2019")]
    #[case("<PubDate><Year>19</Year></PubDate>", "")]
    #[case("<PubDate><MedlineDate>1998 Dec-1999 Jan</MedlineDate></PubDate>", "1998")]
    #[case("<DateCompleted><Year>2020</Year></DateCompleted>", "")]
    fn test_year(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(apply(Column::Year, text), scalar(expected));
    }

    #[test]
    fn test_month_is_scoped_to_pub_date() {
        let text = "<DateCompleted><Month>01</Month></DateCompleted>\
                    <PubDate><Year>2019</Year><Month>Aug</Month></PubDate>";
        assert_eq!(apply(Column::Month, text), scalar("Aug"));
    }

    #[test]
    fn test_journal_is_scoped() {
        let text = "<Journal><JournalIssue><Volume>3</Volume></JournalIssue>\
                    <Title>The Lancet</Title><ISOAbbreviation>Lancet</ISOAbbreviation></Journal>\
                    <Title>Not a journal</Title>";
        assert_eq!(apply(Column::Journal, text), scalar("The Lancet"));
        assert_eq!(apply(Column::JournalAbbr, text), scalar("Lancet"));
    }

    #[test]
    fn test_authors_formatted_and_joined() {
        let text = r#"<AuthorList CompleteYN="Y">
            <Author ValidYN="Y"><LastName>Curie</LastName><ForeName>Marie</ForeName><Initials>M</Initials></Author>
            <Author ValidYN="N"><LastName>Ghost</LastName><ForeName>Gary</ForeName></Author>
            <Author ValidYN="Y" EqualContrib="Y">
                <LastName>Bohr</LastName>
                <ForeName>Niels</ForeName>
            </Author>
        </AuthorList>"#;
        assert_eq!(apply(Column::Authors, text), scalar("Marie Curie, Niels Bohr"));
    }

    #[rstest]
    #[case::initials_only(r#"<Author ValidYN="Y"><LastName>Plato</LastName><Initials>P</Initials></Author>"#)]
    #[case::last_name_only("<Author ValidYN=\"Y\">\n<LastName>Aristotle</LastName>\n</Author>")]
    #[case::collective(r#"<Author ValidYN="Y"><CollectiveName>WHO Group</CollectiveName></Author>"#)]
    #[case::empty_author(r#"<Author ValidYN="Y"></Author>"#)]
    fn test_authors_without_forename_are_skipped(#[case] incomplete: &str) {
        let text = format!(
            "<AuthorList>\n{incomplete}\n<Author ValidYN=\"Y\"><LastName>Curie</LastName><ForeName>Marie</ForeName></Author>\n</AuthorList>"
        );
        assert_eq!(apply(Column::Authors, &text), scalar("Marie Curie"));
    }

    #[test]
    fn test_authors_missing_is_empty_scalar() {
        assert_eq!(apply(Column::Authors, "<Article/>"), scalar(""));
    }

    #[test]
    fn test_abstract_single_section_verbatim() {
        let text = "<Abstract><AbstractText>Just one paragraph.</AbstractText></Abstract>";
        assert_eq!(apply(Column::Abstract, text), scalar("Just one paragraph."));
    }

    #[test]
    fn test_abstract_labelled_sections() {
        let text = r#"<Abstract>
            <AbstractText Label="BACKGROUND" NlmCategory="BACKGROUND">Why.</AbstractText>
            <AbstractText Label="METHODS" NlmCategory="METHODS">How.</AbstractText>
            <AbstractText Label="RESULTS" NlmCategory="RESULTS">What.</AbstractText>
        </Abstract>"#;
        assert_eq!(
            apply(Column::Abstract, text),
            scalar("BACKGROUND: Why.<br>METHODS: How.<br>RESULTS: What.")
        );
    }

    #[test]
    fn test_abstract_unlabelled_section_among_labelled() {
        let text = r#"<Abstract><AbstractText Label="AIM">Aim.</AbstractText><AbstractText>Closing note.</AbstractText></Abstract>"#;
        assert_eq!(apply(Column::Abstract, text), scalar("AIM: Aim.<br>Closing note."));
    }

    #[test]
    fn test_abstract_ignores_other_abstract() {
        let text = r#"<OtherAbstract Type="Publisher"><AbstractText>Resumen.</AbstractText></OtherAbstract>"#;
        assert_eq!(apply(Column::Abstract, text), scalar(""));
    }

    #[test]
    fn test_abstract_section_break_is_configurable() {
        let mut config = MapperConfig::new();
        config.set_section_break("\n").set_section_label_separator(" - ");
        let rule = field_table(&config)
            .unwrap()
            .into_iter()
            .find(|r| r.column == Column::Abstract)
            .unwrap();
        let text = r#"<Abstract><AbstractText Label="A">x</AbstractText><AbstractText Label="B">y</AbstractText></Abstract>"#;
        assert_eq!(rule.apply(text, &config).unwrap(), scalar("A - x\nB - y"));
    }

    #[test]
    fn test_mesh_headings_cross_product() {
        let text = r#"<MeshHeadingList>
            <MeshHeading><DescriptorName UI="D006801" MajorTopicYN="N">Humans</DescriptorName></MeshHeading>
            <MeshHeading>
                <DescriptorName UI="D008099" MajorTopicYN="N">Liver</DescriptorName>
                <QualifierName UI="Q000187" MajorTopicYN="Y">drug effects</QualifierName>
                <QualifierName UI="Q000473" MajorTopicYN="N">pathology</QualifierName>
            </MeshHeading>
        </MeshHeadingList>"#;
        let value = apply(Column::MeshHeadings, text);
        assert_eq!(
            value,
            ExtractedField::List(vec![
                "Humans".to_string(),
                "Liver / drug effects".to_string(),
                "Liver / pathology".to_string(),
            ])
        );
        assert_eq!(
            apply(Column::MajorTopics, text),
            ExtractedField::List(vec!["drug effects".to_string()])
        );
    }

    #[test]
    fn test_major_topics_attribute_order() {
        let text = r#"<DescriptorName MajorTopicYN="Y" UI="D1">Sleep</DescriptorName>
            <DescriptorName UI="D2" MajorTopicYN="Y">Aging</DescriptorName>
            <Keyword MajorTopicYN="Y">circadian</Keyword>
            <Keyword MajorTopicYN="N">minor</Keyword>"#;
        assert_eq!(
            apply(Column::MajorTopics, text),
            ExtractedField::List(vec![
                "Sleep".to_string(),
                "Aging".to_string(),
                "circadian".to_string(),
            ])
        );
    }

    #[test]
    fn test_publication_types() {
        let text = r#"<PublicationTypeList><PublicationType UI="D016428">Journal Article</PublicationType><PublicationType UI="D016454">Review</PublicationType></PublicationTypeList>"#;
        assert_eq!(
            apply(Column::PublicationTypes, text),
            ExtractedField::List(vec!["Journal Article".to_string(), "Review".to_string()])
        );
    }

    #[test]
    fn test_unclosed_mesh_list_is_reported() {
        let text = "<MeshHeadingList><MeshHeading><DescriptorName>Humans</DescriptorName></MeshHeading>";
        let result = rule_for(Column::MeshHeadings).apply(text, &MapperConfig::new());
        assert!(matches!(
            result,
            Err(MalformedRecord::UnclosedScope { field: "mesh_headings", .. })
        ));
    }

    #[test]
    fn test_first_falls_back_past_malformed_scope() {
        // The ArticleIdList is cut off, but ELocationID still provides the DOI
        let text = r#"<ELocationID EIdType="doi">10.1/ok</ELocationID><ArticleIdList><ArticleId IdType="doi">10.2/x</ArticleId>"#;
        assert_eq!(apply(Column::Doi, text), scalar("10.1/ok"));

        let text = r#"<ArticleIdList><ArticleId IdType="doi">10.2/x</ArticleId>"#;
        assert!(rule_for(Column::Doi).apply(text, &MapperConfig::new()).is_err());
    }
}
