use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{CrossReference, DataRelationship, RefEntity, RelationType};
use crate::schema::{InsightsDocument, RaceDocumentVariant, SocialDocument};

// Fixed, rule-assigned confidences. These are match-rule strengths, not
// computed text-similarity scores.
pub const CONFIDENCE_CAR_TOKEN: f64 = 0.9;
pub const CONFIDENCE_DRIVER_MENTION: f64 = 0.8;
pub const CONFIDENCE_MANUFACTURER_SOCIAL: f64 = 0.7;
pub const CONFIDENCE_MANUFACTURER_INSIGHTS: f64 = 0.8;

fn car_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\d+)").expect("static car-token pattern compiles"))
}

#[derive(Debug, Clone)]
struct RaceEntities {
    car_numbers: Vec<String>,
    // (driver, car number) taken from the fastest-lap section.
    drivers: Vec<(String, String)>,
    manufacturers: Vec<String>,
}

fn collect_entities(race: &RaceDocumentVariant) -> RaceEntities {
    let analysis = race.analysis();
    let mut car_numbers: Vec<String> = Vec::new();
    let mut drivers: Vec<(String, String)> = Vec::new();
    let mut manufacturers: Vec<String> = Vec::new();

    let mut push_unique = |list: &mut Vec<String>, value: Option<&String>| {
        if let Some(value) = value {
            if !value.is_empty() && !list.iter().any(|existing| existing == value) {
                list.push(value.clone());
            }
        }
    };

    for car in &analysis.race_strategy_by_car {
        push_unique(&mut car_numbers, car.car_number.as_ref());
        push_unique(&mut manufacturers, car.manufacturer.as_ref());
    }
    for entry in &analysis.fastest_by_car_number {
        push_unique(&mut car_numbers, entry.car_number.as_ref());
        push_unique(&mut manufacturers, entry.manufacturer.as_ref());
        if let (Some(driver), Some(car_number)) = (&entry.driver, &entry.car_number) {
            if !drivers.iter().any(|(existing, _)| existing == driver) {
                drivers.push((driver.clone(), car_number.clone()));
            }
        }
    }
    for entry in &analysis.fastest_by_manufacturer {
        push_unique(&mut manufacturers, entry.manufacturer.as_ref());
    }

    RaceEntities {
        car_numbers,
        drivers,
        manufacturers,
    }
}

// Recomputes the full reference set from scratch on every call; callers
// re-invoke whenever any of the three source documents changes.
pub fn build_cross_references(
    race: &RaceDocumentVariant,
    insights: Option<&InsightsDocument>,
    social: Option<&SocialDocument>,
) -> Vec<CrossReference> {
    if insights.is_none() && social.is_none() {
        return Vec::new();
    }

    let entities = collect_entities(race);
    let mut references = Vec::new();
    let mut seen: HashSet<(String, String, &'static str)> = HashSet::new();

    let mut push = |references: &mut Vec<CrossReference>,
                    source: RefEntity,
                    target: RefEntity,
                    relationship: DataRelationship| {
        let key = (
            format!("{}:{}", source.kind, source.id),
            format!("{}:{}", target.kind, target.id),
            relation_label(relationship.relation_type),
        );
        if seen.insert(key) {
            references.push(CrossReference {
                source,
                target,
                relationship,
            });
        }
    };

    if let Some(social) = social {
        for (index, post) in social.posts.iter().enumerate() {
            let Some(text) = post.text.as_deref() else {
                continue;
            };
            let haystack = text.to_lowercase();
            let source = RefEntity {
                kind: "social_post".to_string(),
                id: index.to_string(),
            };

            // A #<digits> token only links when the digits name a known car.
            for capture in car_token_regex().captures_iter(text) {
                let token = capture[1].to_string();
                if !entities.car_numbers.contains(&token) {
                    continue;
                }
                push(
                    &mut references,
                    source.clone(),
                    RefEntity {
                        kind: "car".to_string(),
                        id: format!("car-{token}"),
                    },
                    DataRelationship {
                        relation_type: RelationType::Car,
                        identifier: token,
                        confidence: CONFIDENCE_CAR_TOKEN,
                    },
                );
            }

            for (driver, car_number) in &entities.drivers {
                if !haystack.contains(&driver.to_lowercase()) {
                    continue;
                }
                push(
                    &mut references,
                    source.clone(),
                    RefEntity {
                        kind: "car".to_string(),
                        id: format!("car-{car_number}"),
                    },
                    DataRelationship {
                        relation_type: RelationType::Driver,
                        identifier: driver.clone(),
                        confidence: CONFIDENCE_DRIVER_MENTION,
                    },
                );
            }

            for manufacturer in &entities.manufacturers {
                if !haystack.contains(&manufacturer.to_lowercase()) {
                    continue;
                }
                push(
                    &mut references,
                    source.clone(),
                    RefEntity {
                        kind: "manufacturer".to_string(),
                        id: format!("manufacturer-{manufacturer}"),
                    },
                    DataRelationship {
                        relation_type: RelationType::Manufacturer,
                        identifier: manufacturer.clone(),
                        confidence: CONFIDENCE_MANUFACTURER_SOCIAL,
                    },
                );
            }
        }
    }

    if let Some(insights) = insights {
        // One haystack: the executive summary plus every marketing angle.
        let mut haystack = insights.executive_summary.clone().unwrap_or_default();
        for angle in &insights.marketing_angles {
            haystack.push(' ');
            haystack.push_str(angle);
        }
        let haystack = haystack.to_lowercase();
        let source = RefEntity {
            kind: "insights".to_string(),
            id: "summary".to_string(),
        };

        for manufacturer in &entities.manufacturers {
            if !haystack.contains(&manufacturer.to_lowercase()) {
                continue;
            }
            push(
                &mut references,
                source.clone(),
                RefEntity {
                    kind: "manufacturer".to_string(),
                    id: format!("manufacturer-{manufacturer}"),
                },
                DataRelationship {
                    relation_type: RelationType::Manufacturer,
                    identifier: manufacturer.clone(),
                    confidence: CONFIDENCE_MANUFACTURER_INSIGHTS,
                },
            );
        }
    }

    references
}

fn relation_label(relation_type: RelationType) -> &'static str {
    match relation_type {
        RelationType::Car => "car",
        RelationType::Driver => "driver",
        RelationType::Manufacturer => "manufacturer",
        RelationType::Team => "team",
    }
}
