//! Deterministic names for demo users and demo complaints.
//!
//! Same RNG seed, same names.

use crate::rng::DemoRng;

pub struct NameGenerator;

impl NameGenerator {
    pub fn first_name(rng: &mut DemoRng) -> &'static str {
        rng.pick(FIRST_NAMES).copied().unwrap_or("Alex")
    }

    pub fn last_name(rng: &mut DemoRng) -> &'static str {
        rng.pick(LAST_NAMES).copied().unwrap_or("Morgan")
    }

    /// A complaint title fitting `category`; generic when the category is unknown.
    pub fn complaint_title(rng: &mut DemoRng, category: &str) -> String {
        let subjects = CATEGORY_SUBJECTS
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, subjects)| *subjects)
            .unwrap_or(GENERIC_SUBJECTS);
        let subject = rng.pick(subjects).copied().unwrap_or("Service issue");
        let place = rng.pick(PLACES).copied().unwrap_or("main street");
        format!("{subject} on {place}")
    }

    pub fn location(rng: &mut DemoRng) -> String {
        let place = rng.pick(PLACES).copied().unwrap_or("main street");
        format!("{} {}", rng.between(1, 240), place)
    }

    pub fn phone_number(rng: &mut DemoRng) -> String {
        format!("+1-555-{:04}", rng.below(10_000))
    }
}

/// Demo category names, in the order tenants receive them.
pub const DEMO_CATEGORIES: &[&str] = &["Water", "Roads", "Waste", "Lighting", "Noise"];

const FIRST_NAMES: &[&str] = &[
    "Amara", "Bastien", "Chiara", "Dmitri", "Elif", "Farid", "Greta", "Hugo", "Ines", "Jonas",
    "Keiko", "Lucas", "Maren", "Nadia", "Omar", "Priya", "Quentin", "Rosa", "Samir", "Tove",
    "Ulla", "Viktor", "Wen", "Yara", "Zoltan", "Aiko", "Bruno", "Celine", "Dario", "Esther",
];

const LAST_NAMES: &[&str] = &[
    "Achebe", "Bergström", "Castillo", "Diallo", "Eriksen", "Fontaine", "Gallagher", "Haddad",
    "Iwasaki", "Jansen", "Kowalski", "Lindqvist", "Mbeki", "Novak", "Okafor", "Petrov",
    "Quispe", "Rahman", "Santos", "Takahashi", "Umarov", "Varga", "Weber", "Yilmaz", "Zeller",
];

const CATEGORY_SUBJECTS: &[(&str, &[&str])] = &[
    ("Water", &["Burst pipe", "Low water pressure", "Discoloured tap water", "Leaking hydrant"]),
    ("Roads", &["Pothole", "Damaged kerb", "Faded crossing markings", "Blocked drain"]),
    ("Waste", &["Missed bin collection", "Overflowing container", "Illegal dumping"]),
    ("Lighting", &["Street light out", "Flickering lamp", "Exposed lamp wiring"]),
    ("Noise", &["Night-time construction noise", "Loud music", "Idling generator"]),
];

const GENERIC_SUBJECTS: &[&str] = &["Service issue", "Request for follow-up", "Damaged public fixture"];

const PLACES: &[&str] = &[
    "Harbour Road", "Elm Avenue", "Station Square", "Mill Lane", "Riverside Walk",
    "Market Street", "North Parade", "Quarry Hill", "Orchard Close", "Bridge Street",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::DemoStream;

    #[test]
    fn titles_match_category() {
        let mut rng = DemoRng::new(3, DemoStream::Intake);
        let title = NameGenerator::complaint_title(&mut rng, "Lighting");
        assert!(
            ["Street light out", "Flickering lamp", "Exposed lamp wiring"]
                .iter()
                .any(|s| title.starts_with(s)),
            "unexpected title {title}"
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let mut a = DemoRng::new(99, DemoStream::Directory);
        let mut b = DemoRng::new(99, DemoStream::Directory);
        assert_eq!(NameGenerator::first_name(&mut a), NameGenerator::first_name(&mut b));
        assert_eq!(NameGenerator::phone_number(&mut a), NameGenerator::phone_number(&mut b));
    }
}
