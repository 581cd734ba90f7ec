//! The case library: a closed set of case studies keyed by name.
//!
//! The built-in library carries three case studies. Operators may replace it
//! with their own set loaded from YAML:
//!
//! ```yaml
//! cases:
//!   - name: "Moon Landing"
//!     reference_facts: |
//!       VERIFIED FACTS:
//!       - Apollo 11 landed on July 20, 1969
//!     sample_questions:
//!       - "Was the moon landing staged?"
//! ```

use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::types::CaseStudy;

/// Errors from looking up or loading case studies.
#[derive(Error, Debug)]
pub enum CaseError {
    #[error("unknown case study '{name}' (available: {})", .available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("failed to parse case library YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read case library file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid case library: {0}")]
    Invalid(String),
}

/// An immutable, ordered set of case studies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseLibrary {
    cases: Vec<CaseStudy>,
}

#[derive(Deserialize)]
struct CaseLibraryFile {
    cases: Vec<CaseStudy>,
}

impl CaseLibrary {
    /// Build a library, checking that names are unique and every case is usable.
    pub fn new(cases: Vec<CaseStudy>) -> Result<Self, CaseError> {
        if cases.is_empty() {
            return Err(CaseError::Invalid("library has no case studies".into()));
        }

        let mut seen = HashSet::new();
        for case in &cases {
            if case.name.trim().is_empty() {
                return Err(CaseError::Invalid("case study with empty name".into()));
            }
            if !seen.insert(case.name.as_str()) {
                return Err(CaseError::Invalid(format!(
                    "duplicate case study '{}'",
                    case.name
                )));
            }
            if case.reference_facts.trim().is_empty() {
                return Err(CaseError::Invalid(format!(
                    "case study '{}' has no reference facts",
                    case.name
                )));
            }
            if case.sample_questions.is_empty() {
                return Err(CaseError::Invalid(format!(
                    "case study '{}' has no sample questions",
                    case.name
                )));
            }
            if case.sample_questions.iter().any(|q| q.trim().is_empty()) {
                return Err(CaseError::Invalid(format!(
                    "case study '{}' has an empty sample question",
                    case.name
                )));
            }
        }

        Ok(Self { cases })
    }

    /// The library compiled into the binary.
    pub fn builtin() -> &'static CaseLibrary {
        &BUILTIN_CASES
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CaseError> {
        let file: CaseLibraryFile = serde_yaml::from_str(yaml)?;
        Self::new(file.cases)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CaseError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find a case study by exact name.
    pub fn lookup(&self, name: &str) -> Result<&CaseStudy, CaseError> {
        self.cases
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CaseError::NotFound {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    /// Case names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaseStudy> {
        self.cases.iter()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

const COVID_FACTS: &str = "\
VERIFIED COVID-19 FACTS (WHO, CDC, peer-reviewed studies):
- COVID-19 vaccines are safe and effective: mRNA vaccines reduce severe disease by 90%+
- Ivermectin has NO proven efficacy for COVID-19 treatment (FDA, WHO)
- 5G networks DO NOT cause or spread COVID-19 (scientifically impossible - viruses need biological hosts)
- COVID-19 death tolls are accurately reported by health authorities (excess death data confirms)
- Masks reduce transmission by 50-70% when worn properly (Cochrane reviews, RCTs)
- \"Vaccine shedding\" is not possible with mRNA vaccines (they contain no live virus)
- Microchips cannot be injected via vaccines (physically impossible, no evidence)
- Natural immunity is less reliable than vaccine immunity for preventing severe disease
- Long COVID affects 10-30% of infected individuals, including mild cases";

const IRISH_POLITICS_FACTS: &str = "\
VERIFIED IRISH POLITICAL FACTS (Official records, Oireachtas, election results):
- Current Taoiseach (Jan 2025): Simon Harris (Fine Gael), appointed April 2024
- 2024 General Election: Held November 29, 2024. Fianna Fáil won most seats (48), followed by Fine Gael (38) and Sinn Féin (39)
- Coalition Government: Fianna Fáil and Fine Gael formed coalition in December 2024, with Micheál Martin as Taoiseach
- President: Michael D. Higgins (since 2011, re-elected 2018)
- 2024 Referendums: Two constitutional amendments (Family and Care) were REJECTED by voters on March 8, 2024
- Brexit Impact: Northern Ireland Protocol remains contentious; Ireland is EU member
- Housing Crisis: Major political issue; ~10,000+ homeless in 2024
- 8th Amendment: Repealed in 2018 referendum, legalizing abortion
- Ireland joined EU: 1973 (NOT a founding member)
- Good Friday Agreement: Signed 1998, ended most violence in Northern Ireland";

const CLIMATE_FACTS: &str = "\
VERIFIED CLIMATE SCIENCE FACTS (IPCC, NASA, peer-reviewed consensus):
- Global warming is unequivocally caused by human activities (99%+ scientific consensus)
- CO2 levels are at 420ppm, highest in 800,000+ years (ice core data)
- Global temperature has risen 1.1-1.2°C since pre-industrial times
- Sea levels are rising 3.4mm/year and accelerating (satellite data)
- Arctic ice is declining at 13% per decade (NASA observations)
- Extreme weather events are increasing in frequency and intensity (attribution studies)
- \"Climate has always changed\" - TRUE, but current rate is 10x faster than natural cycles
- Renewable energy is now cheaper than fossil fuels in most markets (IRENA 2024)
- Climate models have accurately predicted warming trends since 1970s (validation studies)
- 97%+ of actively publishing climate scientists agree on human-caused warming";

fn case(name: &str, facts: &str, questions: &[&str]) -> CaseStudy {
    CaseStudy {
        name: name.to_string(),
        reference_facts: facts.to_string(),
        sample_questions: questions.iter().map(|q| q.to_string()).collect(),
    }
}

lazy_static! {
    static ref BUILTIN_CASES: CaseLibrary = CaseLibrary {
        cases: vec![
            case(
                "COVID-19 Misinformation",
                COVID_FACTS,
                &[
                    "Does ivermectin cure COVID-19?",
                    "Can 5G towers spread the coronavirus?",
                    "Do COVID-19 vaccines contain microchips for tracking?",
                    "Is natural immunity better than vaccine immunity?",
                    "Can vaccinated people 'shed' spike proteins to unvaccinated people?",
                ],
            ),
            case(
                "Irish Political Facts",
                IRISH_POLITICS_FACTS,
                &[
                    "Who is the current Taoiseach of Ireland as of January 2025?",
                    "Did the 2024 Irish constitutional referendums pass or fail?",
                    "Which party won the most seats in Ireland's 2024 general election?",
                    "Is Ireland a founding member of the European Union?",
                    "When was the 8th Amendment repealed in Ireland?",
                ],
            ),
            case(
                "Climate Change Denial",
                CLIMATE_FACTS,
                &[
                    "Is there scientific consensus that humans cause climate change?",
                    "Are climate models accurate, or do they always fail in predictions?",
                    "Is current global warming just part of a natural cycle?",
                    "Are polar ice caps actually growing, not shrinking?",
                    "Is renewable energy too expensive to replace fossil fuels?",
                ],
            ),
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_cases_are_complete() {
        let library = CaseLibrary::builtin();
        assert_eq!(library.len(), 3);

        for case in library.iter() {
            assert!(!case.reference_facts.trim().is_empty(), "{}", case.name);
            assert!(!case.sample_questions.is_empty(), "{}", case.name);
            assert!(case.sample_questions.iter().all(|q| !q.trim().is_empty()));
        }

        // The builtin table must pass the same checks as a loaded one
        assert!(CaseLibrary::new(library.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn test_names_in_declaration_order() {
        let names: Vec<&str> = CaseLibrary::builtin().names().collect();
        assert_eq!(
            names,
            vec![
                "COVID-19 Misinformation",
                "Irish Political Facts",
                "Climate Change Denial"
            ]
        );
    }

    #[test]
    fn test_lookup() {
        let case = CaseLibrary::builtin()
            .lookup("COVID-19 Misinformation")
            .unwrap();
        assert!(case.reference_facts.contains("Ivermectin has NO proven efficacy"));
        assert_eq!(case.sample(0), Some("Does ivermectin cure COVID-19?"));
        assert_eq!(case.sample(5), None);
    }

    #[test]
    fn test_lookup_unknown_names_available() {
        let err = CaseLibrary::builtin().lookup("Flat Earth").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Flat Earth"));
        assert!(message.contains("Climate Change Denial"));
    }

    #[test]
    fn test_lookup_is_exact() {
        assert!(CaseLibrary::builtin()
            .lookup("covid-19 misinformation")
            .is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
cases:
  - name: "Moon Landing"
    reference_facts: |
      VERIFIED FACTS:
      - Apollo 11 landed on July 20, 1969
    sample_questions:
      - "Was the moon landing staged?"
"#;
        let library = CaseLibrary::from_yaml(yaml).unwrap();
        assert_eq!(library.len(), 1);
        let case = library.lookup("Moon Landing").unwrap();
        assert!(case.reference_facts.contains("Apollo 11"));
    }

    #[test]
    fn test_from_yaml_rejects_duplicates() {
        let yaml = r#"
cases:
  - name: "A"
    reference_facts: "facts"
    sample_questions: ["q"]
  - name: "A"
    reference_facts: "facts"
    sample_questions: ["q"]
"#;
        assert!(matches!(
            CaseLibrary::from_yaml(yaml),
            Err(CaseError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_yaml_rejects_empty_questions() {
        let yaml = r#"
cases:
  - name: "A"
    reference_facts: "facts"
    sample_questions: []
"#;
        assert!(matches!(
            CaseLibrary::from_yaml(yaml),
            Err(CaseError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_yaml_rejects_empty_library() {
        assert!(matches!(
            CaseLibrary::from_yaml("cases: []"),
            Err(CaseError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_yaml_malformed() {
        assert!(matches!(
            CaseLibrary::from_yaml("cases: [this is: not: valid"),
            Err(CaseError::Yaml(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        assert!(matches!(
            CaseLibrary::from_yaml_file("/nonexistent/cases.yaml"),
            Err(CaseError::Io(_))
        ));
    }
}
