//! Read-side directory queries. Listings only include businesses whose owner is active,
//! except the grouped view which splits active and banned owners.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, Func, SimpleExpr},
};
use uuid::Uuid;

use crate::{
    dto::destinations::{GroupedDestinations, RatingSummary, ReviewEntry},
    entity::{
        BusinessProfiles, Categories, SavedDestinations, UserActivities, Users,
        business_profiles::{self, Column as ProfileCol},
        categories::Column as CategoryCol,
        saved_destinations::Column as SavedCol,
        sea_orm_active_enums::{ActivityType, UserStatus},
        user_activities::Column as ActivityCol,
        users::{self, Column as UserCol},
    },
    error::{AppError, AppResult},
    models::{BusinessProfile, Category, Destination},
    response::{ApiResponse, Meta},
    services::activity_service::average_rating,
    state::AppState,
};

const RETRIEVED: &str = "Destinations retrieved successfully";

/// `%term%` for a LIKE match, with the pattern metacharacters escaped.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn lower_contains(column: ProfileCol, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((BusinessProfiles, column)))).like(contains_pattern(term))
}

/// Profiles joined with their owner, filtered by owner status and `condition`.
async fn profiles_of<C: ConnectionTrait>(
    conn: &C,
    status: UserStatus,
    condition: Condition,
) -> AppResult<Vec<(business_profiles::Model, Option<users::Model>)>> {
    let rows = BusinessProfiles::find()
        .find_also_related(Users)
        .filter(UserCol::Status.eq(status))
        .filter(condition)
        .order_by_asc(ProfileCol::BusinessName)
        .all(conn)
        .await?;
    Ok(rows)
}

/// Attaches category names, reviews and the average rating to each profile.
pub async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<(business_profiles::Model, Option<users::Model>)>,
) -> AppResult<Vec<Destination>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let categories: HashMap<Uuid, String> = Categories::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let ids: Vec<Uuid> = rows.iter().map(|(p, _)| p.user_id).collect();
    let activities = UserActivities::find()
        .filter(ActivityCol::BusinessUserId.is_in(ids))
        .filter(ActivityCol::ActivityType.is_in([ActivityType::Rate, ActivityType::Review]))
        .order_by_asc(ActivityCol::CreatedAt)
        .all(conn)
        .await?;

    let mut ratings: HashMap<Uuid, Vec<String>> = HashMap::new();
    let mut reviews: HashMap<Uuid, Vec<String>> = HashMap::new();
    for activity in activities {
        let Some(value) = activity.activity_value else {
            continue;
        };
        let bucket = match activity.activity_type {
            ActivityType::Rate => &mut ratings,
            ActivityType::Review => &mut reviews,
            ActivityType::Save => continue,
        };
        bucket.entry(activity.business_user_id).or_default().push(value);
    }

    Ok(rows
        .into_iter()
        .map(|(profile, owner)| {
            let id = profile.user_id;
            let category_name = categories.get(&profile.category_id).cloned();
            let rating = ratings
                .get(&id)
                .map(|values| average_rating(values.iter().map(String::as_str)))
                .unwrap_or(0.0);
            Destination {
                profile: BusinessProfile::from_entity(profile, category_name),
                user_name: owner.map(|u| u.name),
                rating,
                reviews: reviews.remove(&id).unwrap_or_default(),
            }
        })
        .collect())
}

pub async fn active_destinations<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> AppResult<Vec<Destination>> {
    let rows = profiles_of(conn, UserStatus::Active, condition).await?;
    hydrate(conn, rows).await
}

/// Active destinations whose category name is exactly one of `names`.
pub async fn in_categories<C: ConnectionTrait>(
    conn: &C,
    names: &[String],
) -> AppResult<Vec<Destination>> {
    let category_ids: Vec<Uuid> = Categories::find()
        .filter(CategoryCol::Name.is_in(names.iter().cloned()))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }
    active_destinations(
        conn,
        Condition::all().add(ProfileCol::CategoryId.is_in(category_ids)),
    )
    .await
}

fn listed(destinations: Vec<Destination>) -> ApiResponse<Vec<Destination>> {
    let meta = Meta {
        total: Some(destinations.len() as i64),
        ..Meta::empty()
    };
    ApiResponse::success(RETRIEVED, destinations, Some(meta))
}

pub async fn list_all(state: &AppState) -> AppResult<ApiResponse<Vec<Destination>>> {
    let destinations = active_destinations(&state.orm, Condition::all()).await?;
    Ok(listed(destinations))
}

pub async fn grouped_by_status(state: &AppState) -> AppResult<ApiResponse<GroupedDestinations>> {
    let active = active_destinations(&state.orm, Condition::all()).await?;
    let banned_rows = profiles_of(&state.orm, UserStatus::Banned, Condition::all()).await?;
    let banned = hydrate(&state.orm, banned_rows).await?;

    Ok(ApiResponse::success(
        RETRIEVED,
        GroupedDestinations { active, banned },
        Some(Meta::empty()),
    ))
}

pub async fn by_name(state: &AppState, name: &str) -> AppResult<ApiResponse<Vec<Destination>>> {
    let condition = Condition::all().add(lower_contains(ProfileCol::BusinessName, name));
    let destinations = active_destinations(&state.orm, condition).await?;
    Ok(listed(destinations))
}

/// `category` is either a category id or part of a category name.
pub async fn by_category(
    state: &AppState,
    category: &str,
) -> AppResult<ApiResponse<Vec<Destination>>> {
    let found = match Uuid::parse_str(category.trim()) {
        Ok(id) => Categories::find_by_id(id).one(&state.orm).await?,
        Err(_) => {
            Categories::find()
                .filter(
                    Expr::expr(Func::lower(Expr::col(CategoryCol::Name)))
                        .like(contains_pattern(category)),
                )
                .order_by_asc(CategoryCol::Name)
                .one(&state.orm)
                .await?
        }
    };
    let category = found.ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    let condition = Condition::all().add(ProfileCol::CategoryId.eq(category.id));
    let destinations = active_destinations(&state.orm, condition).await?;
    Ok(listed(destinations))
}

pub async fn by_district(
    state: &AppState,
    district: &str,
) -> AppResult<ApiResponse<Vec<Destination>>> {
    let condition = Condition::all().add(lower_contains(ProfileCol::District, district));
    let destinations = active_destinations(&state.orm, condition).await?;
    Ok(listed(destinations))
}

pub async fn by_owner(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<Destination>> {
    let condition = Condition::all().add(ProfileCol::UserId.eq(user_id));
    let destination = active_destinations(&state.orm, condition)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Destination not found.".into()))?;

    Ok(ApiResponse::success(
        "Destination retrieved successfully",
        destination,
        Some(Meta::empty()),
    ))
}

pub async fn reviews(
    state: &AppState,
    business_user_id: Uuid,
) -> AppResult<ApiResponse<Vec<ReviewEntry>>> {
    let rows = UserActivities::find()
        .filter(ActivityCol::BusinessUserId.eq(business_user_id))
        .filter(ActivityCol::ActivityType.eq(ActivityType::Review))
        .order_by_desc(ActivityCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let reviewer_ids: HashSet<Uuid> = rows.iter().map(|r| r.user_id).collect();
    let names: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(reviewer_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    let entries = rows
        .into_iter()
        .map(|r| ReviewEntry {
            id: r.id,
            user_id: r.user_id,
            user_name: names.get(&r.user_id).cloned(),
            review: r.activity_value.unwrap_or_default(),
            created_at: r.created_at.with_timezone(&chrono::Utc),
        })
        .collect();

    Ok(ApiResponse::success(
        "Reviews retrieved successfully",
        entries,
        Some(Meta::empty()),
    ))
}

pub async fn rating(
    state: &AppState,
    business_user_id: Uuid,
) -> AppResult<ApiResponse<RatingSummary>> {
    let values: Vec<String> = UserActivities::find()
        .filter(ActivityCol::BusinessUserId.eq(business_user_id))
        .filter(ActivityCol::ActivityType.eq(ActivityType::Rate))
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|a| a.activity_value)
        .collect();

    let summary = RatingSummary {
        business_user_id,
        rating: average_rating(values.iter().map(String::as_str)),
        count: values.len(),
    };
    Ok(ApiResponse::success(
        "Rating retrieved successfully",
        summary,
        Some(Meta::empty()),
    ))
}

pub async fn categories(state: &AppState) -> AppResult<ApiResponse<Vec<Category>>> {
    let items = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::success(
        "Categories retrieved successfully",
        items,
        Some(Meta::empty()),
    ))
}

pub async fn saved_by_user(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<Vec<Destination>>> {
    let business_ids: Vec<Uuid> = SavedDestinations::find()
        .filter(SavedCol::UserId.eq(user_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|s| s.business_user_id)
        .collect();

    let destinations = if business_ids.is_empty() {
        Vec::new()
    } else {
        let condition = Condition::all().add(ProfileCol::UserId.is_in(business_ids));
        active_destinations(&state.orm, condition).await?
    };

    Ok(ApiResponse::success(
        "Saved destinations retrieved successfully",
        destinations,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_lowercases_and_escapes() {
        assert_eq!(contains_pattern(" Grand Hotel "), "%grand hotel%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
