use serde::{Deserialize, Serialize};

/// Bucketed answer to "How many resumes do you typically check per job role?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResumesPerRole {
    #[serde(rename = "Less than 100")]
    LessThan100,
    #[serde(rename = "100–500")]
    From100To500,
    #[serde(rename = "500–1,000")]
    From500To1000,
    #[serde(rename = "1,000+")]
    MoreThan1000,
}

impl ResumesPerRole {
    pub const ALL: [ResumesPerRole; 4] = [
        ResumesPerRole::LessThan100,
        ResumesPerRole::From100To500,
        ResumesPerRole::From500To1000,
        ResumesPerRole::MoreThan1000,
    ];

    /// Value stored in the signup sheet column.
    pub fn wire_value(self) -> &'static str {
        match self {
            ResumesPerRole::LessThan100 => "Less than 100",
            ResumesPerRole::From100To500 => "100–500",
            ResumesPerRole::From500To1000 => "500–1,000",
            ResumesPerRole::MoreThan1000 => "1,000+",
        }
    }

    pub fn label(self) -> &'static str {
        self.wire_value()
    }
}

/// Bucketed answer to "On average, how many job roles do you handle per month?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobRolesPerMonth {
    #[serde(rename = "1–5")]
    OneToFive,
    #[serde(rename = "6–20")]
    SixToTwenty,
    #[serde(rename = "21–50")]
    TwentyOneToFifty,
    #[serde(rename = "50+")]
    FiftyPlus,
}

impl JobRolesPerMonth {
    pub const ALL: [JobRolesPerMonth; 4] = [
        JobRolesPerMonth::OneToFive,
        JobRolesPerMonth::SixToTwenty,
        JobRolesPerMonth::TwentyOneToFifty,
        JobRolesPerMonth::FiftyPlus,
    ];

    pub fn wire_value(self) -> &'static str {
        match self {
            JobRolesPerMonth::OneToFive => "1–5",
            JobRolesPerMonth::SixToTwenty => "6–20",
            JobRolesPerMonth::TwentyOneToFifty => "21–50",
            JobRolesPerMonth::FiftyPlus => "50+",
        }
    }

    pub fn label(self) -> &'static str {
        self.wire_value()
    }
}

/// 1-5 ordinal answer to "How painful or time-consuming is resume screening
/// for you?". The wire value is the bare ordinal; the descriptive text on the
/// scale ends is display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PainLevel {
    #[serde(rename = "1")]
    NotPainful,
    #[serde(rename = "2")]
    Slight,
    #[serde(rename = "3")]
    Moderate,
    #[serde(rename = "4")]
    High,
    #[serde(rename = "5")]
    Extreme,
}

impl PainLevel {
    pub const ALL: [PainLevel; 5] = [
        PainLevel::NotPainful,
        PainLevel::Slight,
        PainLevel::Moderate,
        PainLevel::High,
        PainLevel::Extreme,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            PainLevel::NotPainful => 1,
            PainLevel::Slight => 2,
            PainLevel::Moderate => 3,
            PainLevel::High => 4,
            PainLevel::Extreme => 5,
        }
    }

    pub fn wire_value(self) -> &'static str {
        match self {
            PainLevel::NotPainful => "1",
            PainLevel::Slight => "2",
            PainLevel::Moderate => "3",
            PainLevel::High => "4",
            PainLevel::Extreme => "5",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PainLevel::NotPainful => "1 (Not painful)",
            PainLevel::Slight => "2",
            PainLevel::Moderate => "3",
            PainLevel::High => "4",
            PainLevel::Extreme => "5 (Extremely painful)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionId {
    ResumesPerRole,
    JobRolesPerMonth,
    PainLevel,
}

/// A selected answer to one of the fixed questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    ResumesPerRole(ResumesPerRole),
    JobRolesPerMonth(JobRolesPerMonth),
    PainLevel(PainLevel),
}

impl QuestionId {
    /// Maps a zero-based option index (as rendered by a front end) back to the
    /// typed answer for this question. `None` when the index is out of range.
    pub fn answer_from_index(self, index: usize) -> Option<Answer> {
        match self {
            QuestionId::ResumesPerRole => ResumesPerRole::ALL
                .get(index)
                .copied()
                .map(Answer::ResumesPerRole),
            QuestionId::JobRolesPerMonth => JobRolesPerMonth::ALL
                .get(index)
                .copied()
                .map(Answer::JobRolesPerMonth),
            QuestionId::PainLevel => PainLevel::ALL.get(index).copied().map(Answer::PainLevel),
        }
    }

    pub fn option_labels(self) -> Vec<&'static str> {
        match self {
            QuestionId::ResumesPerRole => ResumesPerRole::ALL.iter().map(|v| v.label()).collect(),
            QuestionId::JobRolesPerMonth => {
                JobRolesPerMonth::ALL.iter().map(|v| v.label()).collect()
            }
            QuestionId::PainLevel => PainLevel::ALL.iter().map(|v| v.label()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: &'static str,
}

/// The fixed multiple-choice questions, in presentation order. The trailing
/// free-text step is not listed here; see [`FREE_TEXT_PROMPT`].
pub const QUESTIONS: [Question; 3] = [
    Question {
        id: QuestionId::ResumesPerRole,
        prompt: "How many resumes do you typically check per job role?",
    },
    Question {
        id: QuestionId::JobRolesPerMonth,
        prompt: "On average, how many job roles do you handle per month?",
    },
    Question {
        id: QuestionId::PainLevel,
        prompt: "How painful or time-consuming is resume screening for you?",
    },
];

pub const FREE_TEXT_PROMPT: &str =
    "[Optional] What's your biggest frustration with resume screening?";
