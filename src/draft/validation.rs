use crate::events::model::{
    parse_event_date, DraftField, Event, EventDraft, EventType, ImageArtifact, ValidEventDraft,
};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use voca_rs::count::count_graphemes;

pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

const STORED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const IMAGE_REQUIRED: &str = "Zdjęcie jest wymagane";
const IMAGE_TYPE_NOT_ALLOWED: &str = "Dozwolone formaty zdjęć to JPEG, PNG lub WEBP";

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to create email regex");
    static ref PHONE_PATTERN: Regex =
        Regex::new(r"^[0-9+\-() ]+$").expect("Failed to create phone regex");
    static ref EVENT_DRAFT_SCHEMA: Vec<FieldRules> = vec![
        FieldRules::new(
            DraftField::Title,
            vec![
                Rule::Required("Tytuł jest wymagany"),
                Rule::MinChars(3, "Tytuł musi mieć co najmniej 3 znaki"),
                Rule::MaxChars(100, "Tytuł może mieć maksymalnie 100 znaków"),
            ],
        ),
        FieldRules::new(
            DraftField::Date,
            vec![
                Rule::Required("Data jest wymagana"),
                Rule::Satisfies(is_event_date, "Nieprawidłowy format daty"),
            ],
        ),
        FieldRules::new(
            DraftField::Description,
            vec![
                Rule::Required("Opis jest wymagany"),
                Rule::MinChars(10, "Opis musi mieć co najmniej 10 znaków"),
                Rule::MaxChars(1000, "Opis może mieć maksymalnie 1000 znaków"),
            ],
        ),
        FieldRules::new(
            DraftField::Type,
            vec![
                Rule::Required("Wybierz typ wydarzenia"),
                Rule::Satisfies(is_event_type, "Nieprawidłowy typ wydarzenia"),
            ],
        ),
        FieldRules::new(
            DraftField::Phone,
            vec![
                Rule::Required("Numer telefonu jest wymagany"),
                Rule::MinChars(9, "Numer telefonu musi mieć co najmniej 9 znaków"),
                Rule::Matches(
                    &*PHONE_PATTERN,
                    "Numer telefonu może zawierać tylko cyfry, spacje oraz znaki + - ( )",
                ),
                Rule::Satisfies(has_digit, "Numer telefonu musi zawierać cyfry"),
            ],
        ),
        FieldRules::new(
            DraftField::Email,
            vec![
                Rule::Required("Email jest wymagany"),
                Rule::Matches(&*EMAIL_PATTERN, "Nieprawidłowy adres email"),
            ],
        ),
        FieldRules::new(
            DraftField::Location,
            vec![
                Rule::Required("Lokalizacja jest wymagana"),
                Rule::MinChars(5, "Lokalizacja musi mieć co najmniej 5 znaków"),
                Rule::MaxChars(200, "Lokalizacja może mieć maksymalnie 200 znaków"),
            ],
        ),
    ];
}

/// One check on a trimmed text value, with the message shown when it fails
enum Rule {
    Required(&'static str),
    MinChars(usize, &'static str),
    MaxChars(usize, &'static str),
    Matches(&'static Regex, &'static str),
    Satisfies(fn(&str) -> bool, &'static str),
}

impl Rule {
    fn check(&self, value: &str) -> Result<(), &'static str> {
        let passes = match self {
            Rule::Required(_) => !value.is_empty(),
            Rule::MinChars(min, _) => count_graphemes(value) >= *min,
            Rule::MaxChars(max, _) => count_graphemes(value) <= *max,
            Rule::Matches(pattern, _) => pattern.is_match(value),
            Rule::Satisfies(predicate, _) => predicate(value),
        };

        if passes {
            Ok(())
        } else {
            Err(self.message())
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Rule::Required(message)
            | Rule::MinChars(_, message)
            | Rule::MaxChars(_, message)
            | Rule::Matches(_, message)
            | Rule::Satisfies(_, message) => *message,
        }
    }
}

/// Rules of one field, checked in order. Only the first failure is reported.
struct FieldRules {
    field: DraftField,
    rules: Vec<Rule>,
}

impl FieldRules {
    fn new(field: DraftField, rules: Vec<Rule>) -> Self {
        Self { field, rules }
    }

    fn check(&self, value: &str) -> Result<(), &'static str> {
        self.rules.iter().try_for_each(|rule| rule.check(value))
    }
}

/// Field name to message, one message per failing field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<DraftField, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = DraftField> + '_ {
        self.0.keys().copied()
    }

    fn insert(&mut self, field: DraftField, message: &str) {
        self.0.insert(field, message.to_string());
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .join("; ");

        write!(f, "{}", joined)
    }
}

/// Checks every field, including the ones after a failing one, and returns
/// the typed draft only when nothing failed.
pub fn validate_draft(draft: &EventDraft) -> Result<ValidEventDraft, ValidationErrors> {
    let mut errors = check_text_fields(draft);

    if let Err(message) = check_images(&draft.image) {
        errors.insert(DraftField::Image, message);
    }

    let date = parse_event_date(&draft.date);
    let event_type = draft.event_type.trim().parse::<EventType>().ok();
    let image = draft.image.first().cloned();

    match (date, event_type, image) {
        (Some(date), Some(event_type), Some(image)) if errors.is_empty() => Ok(ValidEventDraft {
            title: draft.title.trim().to_string(),
            date,
            description: draft.description.trim().to_string(),
            image,
            event_type,
            phone: draft.phone.trim().to_string(),
            email: draft.email.trim().to_string(),
            location: draft.location.trim().to_string(),
        }),
        _ => Err(errors),
    }
}

/// Runs an already stored event through the same rules a draft passes.
/// Its image is a URI without a media type, so it only has to be present.
pub fn validate_event(event: &Event) -> Result<(), ValidationErrors> {
    let draft = EventDraft {
        title: event.title.clone(),
        date: event.date.format(STORED_DATE_FORMAT).to_string(),
        description: event.description.clone(),
        image: vec![],
        event_type: event.event_type.to_string(),
        phone: event.phone.clone(),
        email: event.email.clone(),
        location: event.location.clone(),
    };
    let mut errors = check_text_fields(&draft);

    if event.image.trim().is_empty() {
        errors.insert(DraftField::Image, IMAGE_REQUIRED);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_text_fields(draft: &EventDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    for field_rules in EVENT_DRAFT_SCHEMA.iter() {
        if let Err(message) = field_rules.check(text_value(draft, field_rules.field)) {
            errors.insert(field_rules.field, message);
        }
    }

    errors
}

/// Every selected file must have an allowed media type
pub fn check_images(images: &[ImageArtifact]) -> Result<(), &'static str> {
    if images.is_empty() {
        return Err(IMAGE_REQUIRED);
    }

    let all_allowed = images.iter().all(|image| {
        ALLOWED_IMAGE_TYPES
            .iter()
            .any(|allowed| image.media_type.trim().eq_ignore_ascii_case(allowed))
    });

    if all_allowed {
        Ok(())
    } else {
        Err(IMAGE_TYPE_NOT_ALLOWED)
    }
}

fn text_value(draft: &EventDraft, field: DraftField) -> &str {
    let value = match field {
        DraftField::Title => draft.title.as_str(),
        DraftField::Date => draft.date.as_str(),
        DraftField::Description => draft.description.as_str(),
        DraftField::Type => draft.event_type.as_str(),
        DraftField::Phone => draft.phone.as_str(),
        DraftField::Email => draft.email.as_str(),
        DraftField::Location => draft.location.as_str(),
        DraftField::Image => "",
    };

    value.trim()
}

fn is_event_date(value: &str) -> bool {
    parse_event_date(value).is_some()
}

fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

fn is_event_type(value: &str) -> bool {
    value.parse::<EventType>().is_ok()
}
