use sea_orm::{Condition, EntityTrait, QueryOrder};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::chat::{ChatRequest, ChatResponse},
    entity::{Categories, Users, categories::Column as CategoryCol},
    error::{AppError, AppResult},
    models::Destination,
    response::{ApiResponse, Meta},
    services::{destination_service, recommendation_service},
    state::AppState,
};

/// Minimum similarity, in percent, for a fuzzy name match.
const NAME_MATCH_THRESHOLD: f64 = 80.0;

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Case-insensitive similarity in percent, 100 for identical strings.
pub fn similarity_percent(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 100.0;
    }
    let distance = levenshtein(&a, &b);
    (1.0 - distance as f64 / longest as f64) * 100.0
}

/// Destinations named in `text`: every name the text contains, or else the single most
/// similar name above the threshold.
pub fn match_by_name(text: &str, destinations: &[Destination]) -> Vec<Destination> {
    let lowered = text.to_lowercase();
    let contained: Vec<Destination> = destinations
        .iter()
        .filter(|d| {
            let name = d.profile.business_name.to_lowercase();
            !name.is_empty() && lowered.contains(&name)
        })
        .cloned()
        .collect();
    if !contained.is_empty() {
        return contained;
    }

    destinations
        .iter()
        .map(|d| (similarity_percent(text, &d.profile.business_name), d))
        .filter(|(score, _)| *score > NAME_MATCH_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, d)| vec![d.clone()])
        .unwrap_or_default()
}

pub fn match_by_district(term: &str, destinations: &[Destination]) -> Vec<Destination> {
    let term = term.trim().to_lowercase();
    destinations
        .iter()
        .filter(|d| {
            d.profile
                .district
                .as_deref()
                .is_some_and(|district| district.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}

fn found_reply(destinations: &[Destination], term: &str) -> String {
    match destinations {
        [single] => format!(
            "Here is what I found for \"{term}\": {}.",
            single.profile.business_name
        ),
        many => format!("I found {} destinations for \"{term}\".", many.len()),
    }
}

fn reply(reply: String, destinations: Vec<Destination>) -> ApiResponse<ChatResponse> {
    ApiResponse::success(
        "Chatbot response generated successfully",
        ChatResponse {
            reply,
            destinations,
        },
        Some(Meta::empty()),
    )
}

pub async fn chat(
    state: &AppState,
    user_id: Uuid,
    payload: ChatRequest,
) -> AppResult<ApiResponse<ChatResponse>> {
    payload.validate()?;
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    let message = payload.message.trim();
    let destinations =
        destination_service::active_destinations(&state.orm, Condition::all()).await?;

    let direct = match_by_name(message, &destinations);
    if !direct.is_empty() {
        return Ok(reply(found_reply(&direct, message), direct));
    }

    let term = match state.assistant.extract(message).await {
        Ok(term) => term,
        Err(err) => {
            tracing::warn!(error = ?err, "term extraction failed, continuing without it");
            None
        }
    };

    if let Some(term) = term.as_deref() {
        let by_name = match_by_name(term, &destinations);
        if !by_name.is_empty() {
            return Ok(reply(found_reply(&by_name, term), by_name));
        }

        let by_district = match_by_district(term, &destinations);
        if !by_district.is_empty() {
            return Ok(reply(found_reply(&by_district, term), by_district));
        }

        let category_names: Vec<String> = Categories::find()
            .order_by_asc(CategoryCol::Name)
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        let category = state
            .assistant
            .classify(term, &category_names)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, "category classification failed");
                AppError::Upstream("The assistant is unavailable right now.".into())
            })?;
        if let Some(category) = category {
            let in_category = destinations
                .iter()
                .filter(|d| d.profile.category_name.as_deref() == Some(category.as_str()))
                .cloned()
                .collect::<Vec<_>>();
            if !in_category.is_empty() {
                return Ok(reply(found_reply(&in_category, &category), in_category));
            }
        }
    }

    if message.to_lowercase().contains("recommend") {
        return match recommendation_service::recommend_for(state, user_id).await {
            Ok(recommended) => Ok(reply(
                "Based on your activity, you might enjoy these destinations.".into(),
                recommended,
            )),
            Err(AppError::NotFound(_)) => Ok(reply(
                "Save, rate or review a few destinations first and I can recommend more like them."
                    .into(),
                Vec::new(),
            )),
            Err(err) => Err(err),
        };
    }

    let answer = state.assistant.respond(message).await.map_err(|err| {
        tracing::error!(error = ?err, "chat completion failed");
        AppError::Upstream("The assistant is unavailable right now.".into())
    })?;
    Ok(reply(answer, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BusinessProfile;

    fn destination(name: &str, district: Option<&str>) -> Destination {
        Destination {
            profile: BusinessProfile {
                user_id: Uuid::new_v4(),
                business_name: name.to_string(),
                category_id: Uuid::new_v4(),
                category_name: Some("Hotel".into()),
                district: district.map(str::to_string),
                latitude: None,
                longitude: None,
                opening_hour: None,
                closing_hour: None,
                main_img: None,
                description: None,
                counter_booking: 1,
                available_booking_slots: Vec::new(),
            },
            user_name: None,
            rating: 0.0,
            reviews: Vec::new(),
        }
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity_percent("Hotel", "hotel"), 100.0);
        assert_eq!(similarity_percent("", ""), 100.0);
        assert_eq!(similarity_percent("abc", "xyz"), 0.0);
        // one substitution in ten characters
        assert!((similarity_percent("Blue Lagon", "Blue Lagun") - 90.0).abs() < 1e-9);
    }

    #[test]
    fn contained_names_win() {
        let all = vec![destination("Sea Breeze", None), destination("Mountain Inn", None)];
        let found = match_by_name("is sea breeze open on sunday?", &all);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].profile.business_name, "Sea Breeze");
    }

    #[test]
    fn fuzzy_match_needs_more_than_eighty_percent() {
        let all = vec![destination("Grand Palace Hotel", None)];
        assert_eq!(match_by_name("Grand Palase Hotel", &all).len(), 1);
        assert!(match_by_name("Grand Hotel", &all).is_empty());
    }

    #[test]
    fn district_match_is_case_insensitive_containment() {
        let all = vec![
            destination("A", Some("Old Town")),
            destination("B", Some("Harbour")),
            destination("C", None),
        ];
        let found = match_by_district("old town", &all);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].profile.business_name, "A");
    }
}
