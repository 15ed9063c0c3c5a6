//! End-to-end tests against a throwaway SQLite gazetteer.

use spelunker_query::{
    Concordance, ConnectionConfig, ExistentialFlag, Facet, Filter, PaginationOptions, Placetype,
    SearchOptions, Spelunker, SpelunkerError, UriArgs,
};
use spelunker_query::{AltGeom, PaginationResults};
use spelunker_query_sql::schema::SQLITE_SCHEMA;
use spelunker_query_sql::SqlSpelunker;
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;

const US: i64 = 85633793;
const CALIFORNIA: i64 = 85688637;
const SAN_FRANCISCO: i64 = 85922583;
const OAKLAND: i64 = 85923517;
const OLD_TOWN: i64 = 1108830809;
const MISSION: i64 = 102085387;
const VENUE: i64 = 1108955789;
const CANADA: i64 = 85633041;
const MONTREAL: i64 = 101736545;
const NULL_ISLAND: i64 = 1;

struct Place {
    id: i64,
    parent_id: i64,
    name: &'static str,
    placetype: &'static str,
    country: &'static str,
    latitude: f64,
    longitude: f64,
    is_current: i64,
    is_deprecated: i64,
    cessation: Option<&'static str>,
    belongsto: &'static [i64],
    recent: bool,
}

fn places() -> Vec<Place> {
    let place = |id: i64,
                 parent_id: i64,
                 name: &'static str,
                 placetype: &'static str,
                 country: &'static str,
                 belongsto: &'static [i64]| Place {
        id,
        parent_id,
        name,
        placetype,
        country,
        latitude: 37.7,
        longitude: -122.4,
        is_current: 1,
        is_deprecated: 0,
        cessation: None,
        belongsto,
        recent: false,
    };

    vec![
        place(US, -1, "United States", "country", "US", &[]),
        Place {
            recent: true,
            ..place(CALIFORNIA, US, "California", "region", "US", &[US])
        },
        Place {
            recent: true,
            ..place(SAN_FRANCISCO, CALIFORNIA, "San Francisco", "locality", "US", &[US, CALIFORNIA])
        },
        Place {
            is_deprecated: 1,
            ..place(OAKLAND, CALIFORNIA, "Oakland", "locality", "US", &[US, CALIFORNIA])
        },
        Place {
            is_current: 0,
            is_deprecated: -1,
            cessation: Some("2010"),
            ..place(OLD_TOWN, CALIFORNIA, "Old Town", "locality", "US", &[US, CALIFORNIA])
        },
        place(
            MISSION,
            SAN_FRANCISCO,
            "Mission District",
            "neighbourhood",
            "US",
            &[US, CALIFORNIA, SAN_FRANCISCO],
        ),
        Place {
            latitude: 0.0,
            longitude: 0.0,
            ..place(VENUE, SAN_FRANCISCO, "Lost Cafe", "venue", "US", &[US, CALIFORNIA, SAN_FRANCISCO])
        },
        place(CANADA, -1, "Canada", "country", "CA", &[]),
        Place {
            latitude: 45.5,
            longitude: -73.6,
            ..place(MONTREAL, CANADA, "Montreal", "locality", "CA", &[CANADA])
        },
        Place {
            latitude: 0.0,
            longitude: 0.0,
            is_current: -1,
            ..place(NULL_ISLAND, -1, "Null Island", "custom", "XN", &[])
        },
    ]
}

async fn exec(spelunker: &SqlSpelunker, sql: &str) {
    sqlx::query(sql).execute(spelunker.pool()).await.unwrap();
}

async fn fixture() -> (TempDir, SqlSpelunker) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gazetteer.db");

    let config = ConnectionConfig::new("sql")
        .with_host("sqlite")
        .with_option("dsn", format!("sqlite://{}?mode=rwc", path.display()));

    let spelunker = SqlSpelunker::connect(&config).await.unwrap();

    for ddl in SQLITE_SCHEMA {
        exec(&spelunker, ddl).await;
    }

    let now = chrono::Utc::now().timestamp();

    for p in places() {
        let belongsto = p
            .belongsto
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        sqlx::query(
            "INSERT INTO spr (id, parent_id, name, placetype, inception, cessation, country, repo, latitude, longitude, min_latitude, min_longitude, max_latitude, max_longitude, is_current, is_deprecated, superseded_by, supersedes, belongsto, is_alt, alt_label, lastmodified) VALUES (?, ?, ?, ?, 'uuuu', ?, ?, 'whosonfirst-data-admin-us', ?, ?, ?, ?, ?, ?, ?, ?, '', '', ?, 0, '', ?)",
        )
        .bind(p.id)
        .bind(p.parent_id)
        .bind(p.name.to_string())
        .bind(p.placetype.to_string())
        .bind(p.cessation.map(str::to_string))
        .bind(p.country.to_string())
        .bind(p.latitude)
        .bind(p.longitude)
        .bind(p.latitude)
        .bind(p.longitude)
        .bind(p.latitude)
        .bind(p.longitude)
        .bind(p.is_current)
        .bind(p.is_deprecated)
        .bind(belongsto)
        .bind(if p.recent { now } else { 1_000_000_000 })
        .execute(spelunker.pool())
        .await
        .unwrap();

        // Every record is its own ancestor, as written by the indexer
        for ancestor in p.belongsto.iter().chain(std::iter::once(&p.id)) {
            sqlx::query("INSERT INTO ancestors (id, ancestor_id) VALUES (?, ?)")
                .bind(p.id)
                .bind(*ancestor)
                .execute(spelunker.pool())
                .await
                .unwrap();
        }

        sqlx::query("INSERT INTO search (id, placetype, name, names_all) VALUES (?, ?, ?, ?)")
            .bind(p.id)
            .bind(p.placetype.to_string())
            .bind(p.name.to_string())
            .bind(format!("{} {}", p.name, p.placetype))
            .execute(spelunker.pool())
            .await
            .unwrap();
    }

    // An alternate geometry row that must never show up in listings
    exec(
        &spelunker,
        "INSERT INTO spr (id, parent_id, name, placetype, country, latitude, longitude, is_current, is_deprecated, belongsto, is_alt, alt_label, lastmodified) VALUES (85922583, 85688637, 'San Francisco', 'locality', 'US', 37.7, -122.4, 1, 0, '85633793,85688637', 1, 'quattroshapes', 1000000000)",
    )
    .await;

    for (id, other_id, source) in [
        (SAN_FRANCISCO, "Q62", "wd:id"),
        (SAN_FRANCISCO, "5391959", "gn:id"),
        (MONTREAL, "Q340", "wd:id"),
        (US, "Q30", "wd:id"),
    ] {
        sqlx::query("INSERT INTO concordances (id, other_id, other_source) VALUES (?, ?, ?)")
            .bind(id)
            .bind(other_id.to_string())
            .bind(source.to_string())
            .execute(spelunker.pool())
            .await
            .unwrap();
    }

    exec(
        &spelunker,
        r#"INSERT INTO geojson (id, body) VALUES (85922583, '{"type":"Feature","properties":{"wof:id":85922583,"wof:name":"San Francisco"},"geometry":{"type":"Point","coordinates":[-122.4,37.7]}}')"#,
    )
    .await;

    (dir, spelunker)
}

fn ids(places: &spelunker_query::Places) -> Vec<i64> {
    places.results.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn test_descendants_filtered_by_placetype() {
    let (_dir, s) = fixture().await;

    let opts = PaginationOptions::countable(1, 10);
    let filters = vec![Filter::placetype("locality").unwrap()];
    let places = s.get_descendants(&opts, US, &filters).await.unwrap();

    assert!(places.len() <= 10);
    assert_eq!(places.len(), 3);

    for r in &places.results {
        assert!(r.descends_from(US), "{} does not descend from {}", r.id, US);
        assert_eq!(r.placetype, "locality");
        assert!(!r.is_alt);
    }

    assert_eq!(places.pagination.total(), Some(3));
    assert_eq!(places.pagination.pages(), Some(1));
}

#[tokio::test]
async fn test_descendants_page_count_and_overflow() {
    let (_dir, s) = fixture().await;

    let places = s
        .get_descendants(&PaginationOptions::countable(1, 4), US, &[])
        .await
        .unwrap();

    // California, San Francisco, Oakland, Old Town, Mission, the venue
    assert_eq!(places.pagination.total(), Some(6));
    assert_eq!(places.pagination.pages(), Some(2));
    assert_eq!(places.len(), 4);

    let beyond = s
        .get_descendants(&PaginationOptions::countable(3, 4), US, &[])
        .await
        .unwrap();
    assert!(beyond.is_empty());
    assert_eq!(beyond.pagination.pages(), Some(2));
}

#[tokio::test]
async fn test_descendants_cursor_visits_every_record_once() {
    let (_dir, s) = fixture().await;

    let mut seen = Vec::new();
    let mut opts = PaginationOptions::cursor("", 2);

    loop {
        let page = s.get_descendants(&opts, US, &[]).await.unwrap();
        seen.extend(ids(&page));

        match page.pagination.next_cursor() {
            Some(next) => opts = PaginationOptions::cursor(next, 2),
            None => break,
        }
    }

    let unique: HashSet<i64> = seen.iter().copied().collect();
    assert_eq!(unique.len(), seen.len(), "duplicate records in {:?}", seen);

    let all = s
        .get_descendants(&PaginationOptions::countable(1, 100), US, &[])
        .await
        .unwrap();
    let expected: HashSet<i64> = ids(&all).into_iter().collect();
    assert_eq!(unique, expected);
}

#[tokio::test]
async fn test_malformed_cursor_is_invalid_input() {
    let (_dir, s) = fixture().await;

    let err = s
        .get_descendants(&PaginationOptions::cursor("after-abc", 2), US, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SpelunkerError::InvalidInput(_)));
}

#[tokio::test]
async fn test_isdeprecated_filter() {
    let (_dir, s) = fixture().await;
    let opts = PaginationOptions::countable(1, 100);

    let query = |flag| {
        let s = s.clone();
        let opts = opts.clone();
        async move {
            let filters = vec![
                Filter::placetype("locality").unwrap(),
                Filter::IsDeprecated(flag),
            ];
            let places = s.get_descendants(&opts, US, &filters).await.unwrap();
            ids(&places).into_iter().collect::<HashSet<i64>>()
        }
    };

    let not_deprecated = query(ExistentialFlag::False).await;
    assert!(!not_deprecated.contains(&OAKLAND));
    assert!(not_deprecated.contains(&SAN_FRANCISCO));

    let deprecated = query(ExistentialFlag::True).await;
    assert_eq!(deprecated, HashSet::from([OAKLAND]));

    let unknown = query(ExistentialFlag::Unknown).await;
    assert_eq!(unknown, HashSet::from([OLD_TOWN]));
    assert_ne!(unknown, not_deprecated);
}

#[tokio::test]
async fn test_null_flags_match_unknown_filters() {
    let (_dir, s) = fixture().await;
    let mystery = 1108830811;

    exec(
        &s,
        "INSERT INTO spr (id, parent_id, name, placetype, country, latitude, longitude, is_current, is_deprecated, belongsto, is_alt, alt_label, lastmodified) VALUES (1108830811, 85688637, 'Mystery Spot', 'county', 'US', 37.0, -122.0, NULL, NULL, '85633793,85688637', 0, '', 1000000000)",
    )
    .await;

    let opts = PaginationOptions::countable(1, 10);
    let county = Placetype::new("county").unwrap();

    let query = |filter: Filter| {
        let s = s.clone();
        let opts = opts.clone();
        let county = county.clone();
        async move {
            let places = s.has_placetype(&opts, &county, &[filter]).await.unwrap();
            ids(&places)
        }
    };

    let spr = s.get_spr_for_id(mystery, &UriArgs::default()).await.unwrap();
    assert_eq!(spr.is_current, ExistentialFlag::Unknown);
    assert_eq!(spr.is_deprecated, ExistentialFlag::Unknown);

    assert_eq!(query(Filter::IsCurrent(ExistentialFlag::Unknown)).await, vec![mystery]);
    assert_eq!(query(Filter::IsDeprecated(ExistentialFlag::Unknown)).await, vec![mystery]);
    assert_eq!(query(Filter::IsDeprecated(ExistentialFlag::False)).await, vec![mystery]);

    assert!(query(Filter::IsCurrent(ExistentialFlag::True)).await.is_empty());
    assert!(query(Filter::IsCurrent(ExistentialFlag::False)).await.is_empty());
    assert!(query(Filter::IsDeprecated(ExistentialFlag::True)).await.is_empty());
}

#[tokio::test]
async fn test_count_descendants_excludes_self() {
    let (_dir, s) = fixture().await;
    assert_eq!(s.count_descendants(US).await.unwrap(), 6);
    assert_eq!(s.count_descendants(MONTREAL).await.unwrap(), 0);
}

#[tokio::test]
async fn test_descendants_faceted() {
    let (_dir, s) = fixture().await;

    let facets = vec![Facet::new("placetype").unwrap(), Facet::new("iscurrent").unwrap()];
    let facetings = s.get_descendants_faceted(US, &[], &facets).await.unwrap();

    assert_eq!(facetings.len(), 2);
    assert_eq!(facetings[0].facet.property, "placetype");
    assert_eq!(facetings[0].results[0].key, "locality");
    assert_eq!(facetings[0].results[0].count, 3);

    // Single valued dimensions add up to the number of matches
    let total = s.count_descendants(US).await.unwrap();
    assert_eq!(facetings[0].total(), total);
    assert_eq!(facetings[1].total(), total);

    let err = s
        .get_descendants_faceted(US, &[], &[Facet::new("name").unwrap()])
        .await
        .unwrap_err();
    assert!(matches!(err, SpelunkerError::InvalidInput(_)));
}

#[tokio::test]
async fn test_search() {
    let (_dir, s) = fixture().await;
    let opts = PaginationOptions::default();

    let places = s
        .search(&opts, &SearchOptions::new("francisco").unwrap(), &[])
        .await
        .unwrap();
    assert_eq!(ids(&places), vec![SAN_FRANCISCO]);

    let filters = vec![Filter::country("CA").unwrap()];
    let places = s
        .search(&opts, &SearchOptions::new("locality").unwrap(), &filters)
        .await
        .unwrap();
    assert_eq!(ids(&places), vec![MONTREAL]);
}

#[tokio::test]
async fn test_search_without_matches_is_empty() {
    let (_dir, s) = fixture().await;

    let places = s
        .search(
            &PaginationOptions::default(),
            &SearchOptions::new("atlantis").unwrap(),
            &[],
        )
        .await
        .unwrap();

    assert!(places.is_empty());
    assert_eq!(places.pagination.pages(), Some(0));
}

#[tokio::test]
async fn test_search_faceted() {
    let (_dir, s) = fixture().await;

    let facetings = s
        .search_faceted(
            &SearchOptions::new("locality").unwrap(),
            &[],
            &[Facet::new("country").unwrap()],
        )
        .await
        .unwrap();

    let counts: Vec<(String, i64)> = facetings[0]
        .results
        .iter()
        .map(|c| (c.key.clone(), c.count))
        .collect();
    assert_eq!(counts, vec![("US".to_string(), 3), ("CA".to_string(), 1)]);
}

#[tokio::test]
async fn test_recent() {
    let (_dir, s) = fixture().await;

    let places = s
        .get_recent(&PaginationOptions::default(), Duration::from_secs(86400), &[])
        .await
        .unwrap();

    let found: HashSet<i64> = ids(&places).into_iter().collect();
    assert_eq!(found, HashSet::from([CALIFORNIA, SAN_FRANCISCO]));
}

#[tokio::test]
async fn test_placetypes() {
    let (_dir, s) = fixture().await;

    let faceting = s.get_placetypes().await.unwrap();
    assert_eq!(faceting.results[0].key, "locality");
    assert_eq!(faceting.results[0].count, 4);
    assert_eq!(faceting.total(), places().len() as i64);

    let pt = Placetype::new("locality").unwrap();
    let places = s
        .has_placetype(
            &PaginationOptions::default(),
            &pt,
            &[Filter::country("CA").unwrap()],
        )
        .await
        .unwrap();
    assert_eq!(ids(&places), vec![MONTREAL]);
}

#[tokio::test]
async fn test_concordances() {
    let (_dir, s) = fixture().await;
    let opts = PaginationOptions::countable(1, 100);

    let lookup = |c: Concordance, filters: Vec<Filter>| {
        let s = s.clone();
        let opts = opts.clone();
        async move {
            let places = s.has_concordance(&opts, &c, &filters).await.unwrap();
            ids(&places).into_iter().collect::<HashSet<i64>>()
        }
    };

    assert_eq!(
        lookup(Concordance::new("wd", "", ""), vec![]).await,
        HashSet::from([US, SAN_FRANCISCO, MONTREAL])
    );
    assert_eq!(
        lookup(Concordance::new("wd", "", ""), vec![Filter::country("US").unwrap()]).await,
        HashSet::from([US, SAN_FRANCISCO])
    );
    assert_eq!(
        lookup(Concordance::new("wd", "id", "Q340"), vec![]).await,
        HashSet::from([MONTREAL])
    );
    assert_eq!(
        lookup(Concordance::new("", "", "Q62"), vec![]).await,
        HashSet::from([SAN_FRANCISCO])
    );
    assert_eq!(
        lookup(Concordance::new("", "id", ""), vec![]).await,
        HashSet::from([US, SAN_FRANCISCO, MONTREAL])
    );
    assert!(lookup(Concordance::new("gn", "id", "Q62"), vec![]).await.is_empty());

    let faceting = s.get_concordances().await.unwrap();
    let counts: Vec<(String, i64)> = faceting
        .results
        .iter()
        .map(|c| (c.key.clone(), c.count))
        .collect();
    assert_eq!(counts, vec![("wd".to_string(), 3), ("gn".to_string(), 1)]);
}

#[tokio::test]
async fn test_concordance_pages_are_distinct() {
    let (_dir, s) = fixture().await;

    let places = s
        .has_concordance(
            &PaginationOptions::countable(1, 2),
            &Concordance::new("", "id", ""),
            &[],
        )
        .await
        .unwrap();

    assert_eq!(places.len(), 2);
    assert!(matches!(
        places.pagination,
        PaginationResults::Countable { total: 3, pages: 2, .. }
    ));
}

#[tokio::test]
async fn test_null_island() {
    let (_dir, s) = fixture().await;

    let places = s
        .visiting_null_island(&PaginationOptions::default(), &[])
        .await
        .unwrap();
    let found: HashSet<i64> = ids(&places).into_iter().collect();
    assert_eq!(found, HashSet::from([VENUE, NULL_ISLAND]));

    let facetings = s
        .visiting_null_island_faceted(&[], &[Facet::new("iscurrent").unwrap()])
        .await
        .unwrap();
    assert_eq!(facetings[0].total(), 2);
}

#[tokio::test]
async fn test_spr_and_feature_lookup() {
    let (_dir, s) = fixture().await;

    let spr = s.get_spr_for_id(OLD_TOWN, &UriArgs::default()).await.unwrap();
    assert_eq!(spr.name, "Old Town");
    assert_eq!(spr.is_ceased, ExistentialFlag::True);
    assert_eq!(spr.is_current, ExistentialFlag::False);
    assert_eq!(spr.is_deprecated, ExistentialFlag::Unknown);

    let alt = UriArgs::alternate(AltGeom::new("quattroshapes"));
    let spr = s.get_spr_for_id(SAN_FRANCISCO, &alt).await.unwrap();
    assert!(spr.is_alt);
    assert_eq!(spr.path, "859/225/83/85922583-alt-quattroshapes.geojson");

    let err = s.get_spr_for_id(42, &UriArgs::default()).await.unwrap_err();
    assert!(err.is_not_found());

    let feature = s
        .get_feature_for_id(SAN_FRANCISCO, &UriArgs::default())
        .await
        .unwrap();
    let feature: serde_json::Value = serde_json::from_slice(&feature).unwrap();
    assert_eq!(feature["geometry"]["type"], "Point");

    let record = s
        .get_record_for_id(SAN_FRANCISCO, &UriArgs::default())
        .await
        .unwrap();
    let record: serde_json::Value = serde_json::from_slice(&record).unwrap();
    assert_eq!(record["wof:name"], "San Francisco");

    assert!(s
        .get_feature_for_id(MONTREAL, &UriArgs::default())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_unsupported_methods() {
    let (_dir, s) = fixture().await;
    let opts = PaginationOptions::default();

    assert!(s.get_tags().await.unwrap_err().is_not_implemented());
    assert!(s.has_tag(&opts, "coffee", &[]).await.unwrap_err().is_not_implemented());
    assert!(s.get_alternate_placetypes().await.unwrap_err().is_not_implemented());
    assert!(s
        .get_descendants(&opts, US, &[Filter::tag("coffee").unwrap()])
        .await
        .unwrap_err()
        .is_not_implemented());
}

#[tokio::test]
async fn test_backend_failure_is_surfaced() {
    let (_dir, s) = fixture().await;
    exec(&s, "DROP TABLE ancestors").await;

    let err = s
        .get_descendants(&PaginationOptions::default(), US, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, SpelunkerError::Backend(_)));
    assert!(err.to_string().contains("Failed to get descendants of 85633793"));
}
