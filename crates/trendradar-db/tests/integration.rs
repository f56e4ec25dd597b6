//! Integration tests against a real Postgres database.
//!
//! Each test gets its own migrated database via `#[sqlx::test]`.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use trendradar_core::{recompute_indicators, TrendLabel};
use trendradar_db::{NewTrendProduct, NewTrendSignal, TrendFilter, TrendSort};

fn signal(product_type: &str, brands: &[&str]) -> NewTrendSignal {
    NewTrendSignal {
        product_type: product_type.to_string(),
        cut: "oversize".to_string(),
        material: "cotton".to_string(),
        color: Some("black".to_string()),
        style: Some("streetwear".to_string()),
        country: Some("DE".to_string()),
        segment: "womenswear".to_string(),
        market_zone: Some("EU".to_string()),
        brands: brands.iter().map(ToString::to_string).collect(),
        average_price: Some(Decimal::new(2999, 2)),
        observation_count: i32::try_from(brands.len()).unwrap(),
        confirmation_score: i32::try_from(brands.len()).unwrap(),
        is_confirmed: brands.len() >= 3,
        first_seen_at: Utc::now(),
        confirmed_at: (brands.len() >= 3).then(Utc::now),
        source_url: Some(format!("https://example.com/{product_type}")),
    }
}

fn product(name: &str, source_url: &str, trend_key: &str, saturability: i16) -> NewTrendProduct {
    NewTrendProduct {
        trend_key: trend_key.to_string(),
        name: name.to_string(),
        category: "hoodie".to_string(),
        style: Some("streetwear".to_string()),
        cut: "oversize".to_string(),
        material: "cotton".to_string(),
        color: Some("black".to_string()),
        product_brand: Some("Zara".to_string()),
        trend_score: 64,
        trend_score_visual: 65,
        saturability,
        trend_growth_percent: None,
        trend_label: None,
        average_price: Some(Decimal::new(2999, 2)),
        image_url: None,
        source_url: source_url.to_string(),
        market_zone: Some("EU".to_string()),
        segment: "womenswear".to_string(),
        country: Some("DE".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Signals — full replace per family
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn replace_family_signals_converges_on_identical_input(pool: sqlx::PgPool) {
    let signals = vec![
        signal("hoodie", &["Zara", "H&M", "Nike"]),
        signal("jeans", &["Zara", "Levis"]),
    ];

    let (deleted_first, saved_first) =
        trendradar_db::replace_family_signals(&pool, "all-trends", &signals)
            .await
            .expect("first replace");
    assert_eq!(deleted_first, 0);
    assert_eq!(saved_first, 2);

    let (deleted_second, saved_second) =
        trendradar_db::replace_family_signals(&pool, "all-trends", &signals)
            .await
            .expect("second replace");
    assert_eq!(
        deleted_second, saved_first,
        "second run must delete exactly what the first saved"
    );
    assert_eq!(saved_second, saved_first);

    let count = trendradar_db::count_family_signals(&pool, "all-trends")
        .await
        .expect("count");
    assert_eq!(count, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn replace_family_signals_leaves_other_families_alone(pool: sqlx::PgPool) {
    trendradar_db::replace_family_signals(&pool, "zalando-trends", &[signal("hoodie", &["Zara"])])
        .await
        .expect("seed other family");

    trendradar_db::replace_family_signals(&pool, "all-trends", &[])
        .await
        .expect("empty replace");

    let other = trendradar_db::count_family_signals(&pool, "zalando-trends")
        .await
        .expect("count");
    assert_eq!(other, 1, "replacing one family must not touch another");
}

// ---------------------------------------------------------------------------
// Cycle — signals and products replaced behind one commit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn replace_family_cycle_writes_both_tables_and_converges(pool: sqlx::PgPool) {
    let signals = vec![signal("hoodie", &["Zara", "H&M", "Nike"])];
    let products = vec![product(
        "Oversize Hoodie",
        "https://example.com/p/1",
        "hoodie|oversize|cotton",
        40,
    )];

    let first = trendradar_db::replace_family_cycle(&pool, "all-trends", &signals, &products)
        .await
        .expect("first cycle");
    assert_eq!(first.deleted_signals, 0);
    assert_eq!(first.saved_signals, 1);
    assert_eq!(first.deleted_products, 0);
    assert_eq!(first.saved_products, 1);

    let second = trendradar_db::replace_family_cycle(&pool, "all-trends", &signals, &products)
        .await
        .expect("second cycle");
    assert_eq!(
        second.deleted_signals, first.saved_signals,
        "second cycle must delete exactly the signals the first saved"
    );
    assert_eq!(second.deleted_products, first.saved_products);

    let signal_count = trendradar_db::count_family_signals(&pool, "all-trends")
        .await
        .expect("count");
    assert_eq!(signal_count, 1);

    let rows = trendradar_db::list_confirmed_trends(
        &pool,
        &TrendFilter::default(),
        TrendSort::default(),
        50,
    )
    .await
    .expect("list");
    assert_eq!(rows.len(), 1);
}

// ---------------------------------------------------------------------------
// Products — upsert identity is source_url
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn replace_family_products_moves_shared_source_url_between_families(pool: sqlx::PgPool) {
    let shared = product(
        "Oversize Hoodie",
        "https://zalando.example.com/p/1",
        "hoodie|oversize|cotton",
        40,
    );

    trendradar_db::replace_family_products(&pool, "zalando-trends", &[shared.clone()])
        .await
        .expect("seed zalando family");
    trendradar_db::replace_family_products(&pool, "all-trends", &[shared])
        .await
        .expect("replace all-trends");

    let rows = trendradar_db::list_confirmed_trends(
        &pool,
        &TrendFilter::default(),
        TrendSort::default(),
        50,
    )
    .await
    .expect("list");
    assert_eq!(rows.len(), 1, "shared source_url must not duplicate");
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_trend_indicators_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let now = Utc::now();
    let indicators = recompute_indicators(Some(10.0), Some(TrendLabel::Rising), now, now);
    let result =
        trendradar_db::update_trend_indicators(&pool, 424_242, Some(10.0), Some(TrendLabel::Rising), indicators)
            .await;
    assert!(matches!(result, Err(trendradar_db::DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_trend_indicators_writes_score_and_saturability_together(pool: sqlx::PgPool) {
    trendradar_db::replace_family_products(
        &pool,
        "all-trends",
        &[product(
            "Oversize Hoodie",
            "https://zalando.example.com/p/7",
            "hoodie|oversize|cotton",
            40,
        )],
    )
    .await
    .expect("seed");

    let rows = trendradar_db::list_confirmed_trends(
        &pool,
        &TrendFilter::default(),
        TrendSort::default(),
        10,
    )
    .await
    .expect("list");
    let id = rows[0].id;

    let now = Utc::now();
    let indicators = recompute_indicators(Some(40.0), Some(TrendLabel::Rising), now, now);
    let updated = trendradar_db::update_trend_indicators(
        &pool,
        id,
        Some(40.0),
        Some(TrendLabel::Rising),
        indicators,
    )
    .await
    .expect("update");

    assert_eq!(updated.trend_score, indicators.trend_score);
    assert_eq!(updated.saturability, indicators.saturability);
    assert_eq!(updated.trend_label.as_deref(), Some("rising"));
    assert!((updated.trend_growth_percent.unwrap() - 40.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Ranked reads — enrichment join degrades gracefully
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ranked_read_returns_null_enrichment_when_cache_is_cold(pool: sqlx::PgPool) {
    trendradar_db::replace_family_products(
        &pool,
        "all-trends",
        &[product(
            "Oversize Hoodie",
            "https://zalando.example.com/p/2",
            "hoodie|oversize|cotton",
            40,
        )],
    )
    .await
    .expect("seed");

    let rows = trendradar_db::list_confirmed_trends(
        &pool,
        &TrendFilter::default(),
        TrendSort::default(),
        10,
    )
    .await
    .expect("list");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].advice_text.is_none());
    assert!(rows[0].generated_image_url.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn ranked_read_joins_cached_enrichment_by_fingerprint(pool: sqlx::PgPool) {
    trendradar_db::replace_family_products(
        &pool,
        "all-trends",
        &[product(
            "Oversize Hoodie",
            "https://zalando.example.com/p/3",
            "hoodie|oversize|cotton",
            40,
        )],
    )
    .await
    .expect("seed");

    trendradar_db::upsert_generated_image(
        &pool,
        "hoodie|oversize|cotton",
        "studio photo of an oversize cotton hoodie",
        Some("https://cdn.example.com/hoodie.png"),
        Some("Stock neutral colorways first."),
        Some(4),
    )
    .await
    .expect("cache write");

    let rows = trendradar_db::list_confirmed_trends(
        &pool,
        &TrendFilter::default(),
        TrendSort::default(),
        10,
    )
    .await
    .expect("list");
    assert_eq!(
        rows[0].advice_text.as_deref(),
        Some("Stock neutral colorways first.")
    );
    assert_eq!(
        rows[0].generated_image_url.as_deref(),
        Some("https://cdn.example.com/hoodie.png")
    );
    assert_eq!(rows[0].advice_rating, Some(4));
}

#[sqlx::test(migrations = "../../migrations")]
async fn ranked_read_default_sort_is_saturability_ascending(pool: sqlx::PgPool) {
    trendradar_db::replace_family_products(
        &pool,
        "all-trends",
        &[
            product("Saturated", "https://a.example.com/p/1", "jeans|slim|denim", 80),
            product("Fresh", "https://b.example.com/p/1", "hoodie|oversize|cotton", 20),
        ],
    )
    .await
    .expect("seed");

    let rows = trendradar_db::list_confirmed_trends(
        &pool,
        &TrendFilter::default(),
        TrendSort::default(),
        10,
    )
    .await
    .expect("list");
    assert_eq!(rows[0].name, "Fresh", "least exploited trend must rank first");
}

#[sqlx::test(migrations = "../../migrations")]
async fn ranked_read_applies_filters(pool: sqlx::PgPool) {
    let mut menswear = product(
        "Menswear Hoodie",
        "https://c.example.com/p/1",
        "hoodie|oversize|cotton",
        30,
    );
    menswear.segment = "menswear".to_string();
    trendradar_db::replace_family_products(
        &pool,
        "all-trends",
        &[
            product(
                "Womenswear Hoodie",
                "https://d.example.com/p/1",
                "hoodie|oversize|cotton",
                30,
            ),
            menswear,
        ],
    )
    .await
    .expect("seed");

    let filter = TrendFilter {
        segment: Some("menswear".to_string()),
        ..TrendFilter::default()
    };
    let rows = trendradar_db::list_confirmed_trends(&pool, &filter, TrendSort::default(), 10)
        .await
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Menswear Hoodie");
}

// ---------------------------------------------------------------------------
// Enrichment candidates — idempotent selection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn enrichment_candidates_exclude_already_enriched_fingerprints(pool: sqlx::PgPool) {
    trendradar_db::replace_family_products(
        &pool,
        "all-trends",
        &[
            product("Hoodie", "https://e.example.com/p/1", "hoodie|oversize|cotton", 20),
            product("Jeans", "https://e.example.com/p/2", "jeans|slim|denim", 40),
        ],
    )
    .await
    .expect("seed");

    trendradar_db::upsert_generated_image(
        &pool,
        "hoodie|oversize|cotton",
        "prompt",
        Some("https://cdn.example.com/h.png"),
        Some("advice"),
        Some(5),
    )
    .await
    .expect("cache write");

    let candidates = trendradar_db::list_enrichment_candidates(&pool, 10)
        .await
        .expect("candidates");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].trend_key, "jeans|slim|denim");
}

#[sqlx::test(migrations = "../../migrations")]
async fn enrichment_candidates_are_unique_per_fingerprint(pool: sqlx::PgPool) {
    trendradar_db::replace_family_products(
        &pool,
        "all-trends",
        &[
            product("Hoodie A", "https://f.example.com/p/1", "hoodie|oversize|cotton", 20),
            product("Hoodie B", "https://f.example.com/p/2", "hoodie|oversize|cotton", 25),
        ],
    )
    .await
    .expect("seed");

    let candidates = trendradar_db::list_enrichment_candidates(&pool, 10)
        .await
        .expect("candidates");
    assert_eq!(
        candidates.len(),
        1,
        "one provider round trip per fingerprint, not per row"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn generated_image_upsert_never_duplicates_a_fingerprint(pool: sqlx::PgPool) {
    let first = trendradar_db::upsert_generated_image(
        &pool,
        "hoodie|oversize|cotton",
        "prompt v1",
        None,
        Some("advice v1"),
        Some(3),
    )
    .await
    .expect("first upsert");

    let second = trendradar_db::upsert_generated_image(
        &pool,
        "hoodie|oversize|cotton",
        "prompt v2",
        Some("https://cdn.example.com/h.png"),
        None,
        None,
    )
    .await
    .expect("second upsert");

    assert_eq!(first.id, second.id, "updated in place, not duplicated");
    assert_eq!(
        second.advice_text.as_deref(),
        Some("advice v1"),
        "null advice in the update must not clobber the cached value"
    );
    assert_eq!(
        second.image_url.as_deref(),
        Some("https://cdn.example.com/h.png")
    );
}

// ---------------------------------------------------------------------------
// Market index
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn week_point_upsert_overwrites_same_week(pool: sqlx::PgPool) {
    let week = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();

    trendradar_db::upsert_week_point(&pool, "hoodie", "womenswear", "EU", week, 60.0, 30.0, 4)
        .await
        .expect("first upsert");
    trendradar_db::upsert_week_point(&pool, "hoodie", "womenswear", "EU", week, 65.0, 35.0, 6)
        .await
        .expect("second upsert");

    let history = trendradar_db::list_category_history(&pool, "hoodie", "womenswear", "EU")
        .await
        .expect("history");
    assert_eq!(history.len(), 1, "one point per week");
    assert!((history[0].avg_trend_score - 65.0).abs() < f64::EPSILON);

    let latest = trendradar_db::latest_week_point(&pool, "hoodie", "womenswear", "EU")
        .await
        .expect("latest")
        .expect("point exists");
    assert_eq!(latest.sample_count, 6);
}
