//! Entity records produced by extraction (M1 taxonomy, M2 people, M3 artworks)

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Common behaviour of every extracted record
pub trait Entity {
    /// Kind name used in logs and extraction notes
    const KIND: &'static str;

    /// Globally unique identifier (`<kind>_<slug>` by convention)
    fn id(&self) -> &str;

    /// Stamp the provenance label onto the record
    fn stamp_provenance(&mut self, label: &str);
}

/// Accept an explicit JSON `null` wherever a default-able value is expected.
///
/// The completion service regularly writes `"other_names": null` instead of `[]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a year written as an integer, an integral float or a numeric string.
///
/// `null` and blank strings are an unknown year; anything else is an error.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let year = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n.as_f64().and_then(integral_year),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_year))
        }
        Some(other) => {
            return Err(de::Error::custom(format!("expected a year, found {}", other)));
        }
    };

    year.map(Some)
        .ok_or_else(|| de::Error::custom("year is not a whole number in range"))
}

fn integral_year(f: f64) -> Option<i32> {
    let in_range = f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX);
    (f.fract() == 0.0 && in_range).then_some(f as i32)
}

/// Gregorian year range, either end may be unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    /// First year
    #[serde(default, deserialize_with = "lenient_year")]
    pub start: Option<i32>,

    /// Last year
    #[serde(default, deserialize_with = "lenient_year")]
    pub end: Option<i32>,
}

/// A historical place name and the period it was used in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalName {
    /// Name as written in the source
    pub name: String,

    /// Period the name belongs to
    #[serde(default)]
    pub period: Option<String>,
}

/// Temporal ontology: a dynasty or sub-period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    /// Identifier, e.g. `period_tang_high`
    pub id: String,

    /// Standard name, e.g. 盛唐
    pub name: String,

    /// Gregorian range
    #[serde(default)]
    pub time_range: Option<YearRange>,

    /// Traditional dating, e.g. 唐·开元天宝
    #[serde(default)]
    pub dynastic_info: Option<String>,

    /// Provenance label
    #[serde(default)]
    pub source_book: Option<String>,
}

/// Spatial ontology: a geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Identifier, e.g. `loc_suzhou`
    pub id: String,

    /// Names used across periods
    #[serde(default, deserialize_with = "null_as_default")]
    pub historical_names: Vec<HistoricalName>,

    /// Modern address, e.g. 江苏省苏州市
    #[serde(default)]
    pub modern_address: Option<String>,

    /// `[lat, lon]`
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,

    /// Provenance label
    #[serde(default)]
    pub source_book: Option<String>,
}

/// Iconography ontology: subject-matter classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iconography {
    /// Identifier, e.g. `icon_lohan`
    pub id: String,

    /// Names keyed by language code, e.g. `{"zh": "罗汉", "en": "Arhat"}`
    pub name: BTreeMap<String, String>,

    /// Parent category
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Distinguishing visual features
    #[serde(default, deserialize_with = "null_as_default")]
    pub visual_elements: Vec<String>,

    /// Provenance label
    #[serde(default)]
    pub source_book: Option<String>,
}

fn default_primary_role() -> String {
    "Painter".to_string()
}

/// A historical figure: painter, collector, connoisseur, critic or patron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Identifier
    pub id: String,

    /// Core identity
    #[serde(default = "default_primary_role")]
    pub primary_role: String,

    /// Common full name
    pub name: String,

    /// Courtesy name (字)
    #[serde(default)]
    pub courtesy_name: Option<String>,

    /// Pseudonym (号)
    #[serde(default)]
    pub pseudonym: Option<String>,

    /// Temple, posthumous, dharma names and so on
    #[serde(default, deserialize_with = "null_as_default")]
    pub other_names: Vec<String>,

    /// Ancestral home (籍贯)
    #[serde(default)]
    pub choronym: Option<String>,

    /// Free-form birth/death information, e.g. `{"birth": 1254, "death": 1322}`
    #[serde(default)]
    pub birth_death: Option<Map<String, Value>>,

    /// Reference to a [`Period`]
    #[serde(default)]
    pub period_ref: Option<String>,

    /// External authority ids (CBDB, Wikidata)
    #[serde(default, deserialize_with = "null_as_default")]
    pub authority_ids: BTreeMap<String, String>,

    /// Biography text
    #[serde(default)]
    pub biography: Option<String>,

    /// Provenance label
    #[serde(default)]
    pub source_book: Option<String>,
}

/// A career or travel record for a person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    /// Identifier, e.g. `cv_zhao_001`
    pub id: String,

    /// Reference to a [`Person`]
    pub person_ref: String,

    /// Recommendation, Examination, Hereditary
    #[serde(default)]
    pub entry_mode: Option<String>,

    /// Official title, e.g. 兵部侍郎
    #[serde(default)]
    pub official_title: Option<String>,

    /// Rank (品阶)
    #[serde(default)]
    pub rank: Option<String>,

    /// Tenure
    #[serde(default)]
    pub tenure: Option<YearRange>,

    /// Reference to a [`Location`]
    #[serde(default)]
    pub location_ref: Option<String>,

    /// Reference to a [`Period`]
    #[serde(default)]
    pub time_ref: Option<String>,

    /// Official_Post, Travel, Examination
    #[serde(default)]
    pub event_type: Option<String>,

    /// Provenance label
    #[serde(default)]
    pub source_book: Option<String>,
}

/// A directed social tie between two people
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialRelation {
    /// Identifier, e.g. `rel_001`
    pub id: String,

    /// Reference to the source [`Person`]
    pub source_id: String,

    /// Reference to the target [`Person`]
    pub target_id: String,

    /// Kinship, Master_Student, Friendship, Colleague (free text from the model)
    pub relation_type: String,

    /// Formal description, e.g. 师生
    #[serde(default)]
    pub formal_name: Option<String>,

    /// Provenance label
    #[serde(default)]
    pub source_book: Option<String>,
}

/// A painting or calligraphy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    /// Identifier
    pub id: String,

    /// Title, e.g. 洛神赋图
    pub title: String,

    /// Reference to the creating [`Person`]
    #[serde(default)]
    pub creator_ref: Option<String>,

    /// Reference to a [`Period`], mostly for anonymous works
    #[serde(default)]
    pub period_ref: Option<String>,

    /// Reference to an [`Iconography`]
    #[serde(default)]
    pub icon_ref: Option<String>,

    /// Extant, Lost, Copy
    #[serde(default)]
    pub status: Option<String>,

    /// Silk, Paper, Wall
    #[serde(default)]
    pub support: Option<String>,

    /// e.g. `{"height": 27.1, "width": 572.8, "unit": "cm"}`
    #[serde(default)]
    pub dimensions: Option<Map<String, Value>>,

    /// Current repository, e.g. 故宫博物院
    #[serde(default)]
    pub repository: Option<String>,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Provenance label
    #[serde(default)]
    pub source_book: Option<String>,
}

/// A critical record about a person or a work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literature {
    /// Identifier, e.g. `lit_001`
    pub id: String,

    /// Reference to a [`Person`] or a [`Work`]
    pub target_ref: String,

    /// The cited book, e.g. 《宣和画谱》
    #[serde(default)]
    pub source_book: Option<String>,

    /// Reference to the critic
    #[serde(default)]
    pub author_ref: Option<String>,

    /// 神品, 妙品, 能品, 逸品
    #[serde(default)]
    pub quality_rank: Option<String>,

    /// Quoted original text
    #[serde(default)]
    pub quote: Option<String>,

    /// Provenance label
    #[serde(default)]
    pub source_book_ref: Option<String>,
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:literal),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: &'static str = $kind;

                fn id(&self) -> &str {
                    &self.id
                }

                fn stamp_provenance(&mut self, label: &str) {
                    self.source_book = Some(label.to_string());
                }
            }
        )+
    };
}

impl_entity! {
    Period => "period",
    Location => "location",
    Iconography => "iconography",
    Person => "person",
    CvRecord => "cv_record",
    SocialRelation => "social_relation",
    Work => "work",
}

impl Entity for Literature {
    const KIND: &'static str = "literature";

    fn id(&self) -> &str {
        &self.id
    }

    // `source_book` names the cited text here, so provenance goes to its own field.
    fn stamp_provenance(&mut self, label: &str) {
        self.source_book_ref = Some(label.to_string());
        if self.source_book.as_deref().map_or(true, |s| s.trim().is_empty()) {
            self.source_book = Some(label.to_string());
        }
    }
}
