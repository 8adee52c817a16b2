//! CSV import boundary for candidates, opportunities, and preferences.
//!
//! Onboarding exports arrive as three files. Academic figures are parsed
//! leniently: an unparsable grade or percentage becomes `None` and scoring
//! degrades to its documented partial credit instead of rejecting the row.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::super::domain::{
    CandidateId, CandidateProfile, Opportunity, OpportunityId, Preference,
};

/// Candidates list at most this many preferred work locations.
const MAX_LOCATION_PREFERENCES: usize = 3;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { context: &'static str, detail: String },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::InvalidRow { context, detail } => {
                write!(f, "invalid {} row: {}", context, detail)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn candidates_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<CandidateProfile>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::candidates_from_reader(file)
    }

    pub fn candidates_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<CandidateProfile>, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut profiles = Vec::new();

        for record in csv_reader.deserialize::<CandidateRow>() {
            let row = record?;
            if row.id.is_empty() {
                return Err(RosterImportError::InvalidRow {
                    context: "candidate",
                    detail: format!("missing candidate id (name '{}')", row.full_name),
                });
            }
            profiles.push(row.into_profile());
        }

        Ok(profiles)
    }

    pub fn opportunities_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<Opportunity>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::opportunities_from_reader(file)
    }

    pub fn opportunities_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<Opportunity>, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut opportunities = Vec::new();

        for record in csv_reader.deserialize::<OpportunityRow>() {
            let row = record?;
            if row.id.is_empty() {
                return Err(RosterImportError::InvalidRow {
                    context: "opportunity",
                    detail: format!("missing opportunity id (role '{}')", row.role),
                });
            }
            opportunities.push(row.into_opportunity());
        }

        Ok(opportunities)
    }

    pub fn preferences_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<Preference>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::preferences_from_reader(file)
    }

    pub fn preferences_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<Preference>, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut preferences = Vec::new();

        for record in csv_reader.deserialize::<PreferenceRow>() {
            let row = record?;
            if row.candidate_id.is_empty() {
                return Err(RosterImportError::InvalidRow {
                    context: "preference",
                    detail: "missing candidate id".to_string(),
                });
            }
            if row.rank == 0 {
                return Err(RosterImportError::InvalidRow {
                    context: "preference",
                    detail: format!("rank must be 1-based (candidate '{}')", row.candidate_id),
                });
            }
            preferences.push(row.into_preference());
        }

        Ok(preferences)
    }
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    #[serde(rename = "Candidate ID")]
    id: String,
    #[serde(rename = "Full Name")]
    full_name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Qualification", default)]
    qualification: String,
    #[serde(rename = "Skills", default)]
    skills: String,
    #[serde(rename = "Grade Average", default, deserialize_with = "empty_string_as_none")]
    grade_average: Option<String>,
    #[serde(rename = "Secondary %", default, deserialize_with = "empty_string_as_none")]
    secondary: Option<String>,
    #[serde(
        rename = "Higher Secondary %",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    higher_secondary: Option<String>,
    #[serde(rename = "Locations", default)]
    locations: String,
}

impl CandidateRow {
    fn into_profile(self) -> CandidateProfile {
        let skills = split_list(&self.skills, ',');
        let location_preferences = split_list(&self.locations, '|')
            .into_iter()
            .take(MAX_LOCATION_PREFERENCES)
            .collect();

        CandidateProfile {
            id: CandidateId(self.id),
            full_name: self.full_name,
            email: self.email,
            qualification: self.qualification,
            skills,
            grade_average: self.grade_average.as_deref().and_then(parse_figure),
            secondary_percentage: self.secondary.as_deref().and_then(parse_figure),
            higher_secondary_percentage: self
                .higher_secondary
                .as_deref()
                .and_then(parse_figure),
            location_preferences,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpportunityRow {
    #[serde(rename = "Opportunity ID")]
    id: String,
    #[serde(rename = "Role")]
    role: String,
    #[serde(rename = "Organization")]
    organization: String,
    #[serde(rename = "Sector", default)]
    sector: String,
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(rename = "Seats")]
    seats: u32,
    #[serde(rename = "Required Skills", default)]
    required_skills: String,
    #[serde(rename = "Min Score", default, deserialize_with = "empty_string_as_none")]
    min_score: Option<String>,
    #[serde(rename = "Required Education", default)]
    required_education: String,
    #[serde(rename = "Stipend", default, deserialize_with = "empty_string_as_none")]
    stipend: Option<String>,
    #[serde(rename = "Duration", default, deserialize_with = "empty_string_as_none")]
    duration: Option<String>,
}

impl OpportunityRow {
    fn into_opportunity(self) -> Opportunity {
        Opportunity {
            id: OpportunityId(self.id),
            role: self.role,
            organization: self.organization,
            sector: self.sector,
            location: self.location,
            seats: self.seats,
            required_skills: split_list(&self.required_skills, ','),
            min_score: self
                .min_score
                .as_deref()
                .and_then(parse_figure)
                .unwrap_or(0.0),
            required_education: self.required_education,
            stipend: self.stipend,
            duration: self.duration,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PreferenceRow {
    #[serde(rename = "Candidate ID")]
    candidate_id: String,
    #[serde(rename = "Rank")]
    rank: u32,
    #[serde(rename = "Sector", default)]
    sector: String,
    #[serde(rename = "Role", default)]
    role: String,
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(
        rename = "Opportunity ID",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    opportunity_id: Option<String>,
}

impl PreferenceRow {
    fn into_preference(self) -> Preference {
        Preference {
            candidate: CandidateId(self.candidate_id),
            rank: self.rank,
            sector: self.sector,
            role: self.role,
            location: self.location,
            opportunity: self.opportunity_id.map(OpportunityId),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Lenient numeric parse; tolerates a trailing percent sign.
fn parse_figure(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
