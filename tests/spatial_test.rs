//! Radius queries over a fixture of 17 music venues.

use std::sync::Arc;

use fathom::analysis::analyzer::registry::AnalyzerRegistry;
use fathom::document::Document;
use fathom::error::Result;
use fathom::index::{DistanceUnit, IndexStore};
use fathom::indexing::IndexingEngine;
use fathom::policy::{Field, IndexPolicy, QueryPolicy};
use fathom::search::{QueryCriteria, QueryEngine, SearchResults, SpatialFilter};

const VENUES: [(&str, f64, f64); 17] = [
    ("blue-note", 40.7309, -74.0005),
    ("village-vanguard", 40.7360, -74.0017),
    ("birdland", 40.7590, -73.9899),
    ("smalls", 40.7343, -74.0027),
    ("jazz-standard", 40.7421, -73.9838),
    ("green-mill", 41.9690, -87.6597),
    ("jazz-showcase", 41.8728, -87.6262),
    ("andys", 41.8897, -87.6289),
    ("preservation-hall", 29.9584, -90.0654),
    ("snug-harbor", 29.9641, -90.0578),
    ("spotted-cat", 29.9637, -90.0575),
    ("sfjazz", 37.7763, -122.4216),
    ("black-cat", 37.7851, -122.4145),
    ("catalina", 34.0983, -118.3256),
    ("wallys", 42.3437, -71.0810),
    ("jazz-alley", 47.6142, -122.3381),
    ("bakers", 42.4181, -83.2067),
];

struct Venues {
    engine: QueryEngine,
    policy: IndexPolicy,
    query: QueryPolicy,
}

impl Venues {
    fn load() -> Result<Self> {
        let store = Arc::new(IndexStore::new());
        let analyzers = Arc::new(AnalyzerRegistry::new());
        let indexing = IndexingEngine::new(store.clone(), analyzers.clone());
        let policy = IndexPolicy::new("venues")
            .with_field(Field::new("name"))?
            .with_field(Field::latitude("lat"))?
            .with_field(Field::longitude("lng"))?;

        let docs = VENUES
            .iter()
            .map(|(id, lat, lng)| {
                Document::builder()
                    .database("venues")
                    .id(*id)
                    .put("name", id.replace('-', " "))?
                    .put("lat", *lat)?
                    .put("lng", *lng)?
                    .build()
            })
            .collect::<Result<Vec<_>>>()?;
        let report = indexing.index(&policy, vec![Ok(docs)], true)?;
        assert_eq!(report.documents_indexed, 17);

        Ok(Venues {
            engine: QueryEngine::new(store, analyzers),
            policy,
            query: QueryPolicy::new("venues"),
        })
    }

    fn search(&self, criteria: QueryCriteria, limit: usize) -> Result<SearchResults> {
        self.engine
            .search(&criteria, &self.policy, &self.query, false, 0, limit)
    }
}

fn sorted_ids(results: &SearchResults) -> Vec<&str> {
    let mut ids = results.ids();
    ids.sort_unstable();
    ids
}

#[test]
fn test_zero_radius_on_indexed_point() -> Result<()> {
    let venues = Venues::load()?;
    let results = venues.search(QueryCriteria::new().within(41.9690, -87.6597, 0.0), 10)?;
    assert_eq!(results.ids(), vec!["green-mill"]);
    Ok(())
}

#[test]
fn test_radius_around_empty_area_finds_nothing() -> Result<()> {
    let venues = Venues::load()?;
    // central Kansas
    let results = venues.search(QueryCriteria::new().within(38.5, -98.0, 80.0), 10)?;
    assert_eq!(results.total_hits, 0);
    assert!(results.is_empty());
    Ok(())
}

#[test]
fn test_match_all_paginates() -> Result<()> {
    let venues = Venues::load()?;
    let results = venues.search(QueryCriteria::match_all(), 10)?;
    assert_eq!(results.len(), 10);
    assert_eq!(results.total_hits, 17);
    Ok(())
}

#[test]
fn test_radius_selects_a_city() -> Result<()> {
    let venues = Venues::load()?;
    let results = venues.search(QueryCriteria::new().within(40.7359, -73.9911, 5.0), 20)?;
    assert_eq!(
        sorted_ids(&results),
        vec!["birdland", "blue-note", "jazz-standard", "smalls", "village-vanguard"]
    );
    Ok(())
}

#[test]
fn test_radius_unit() -> Result<()> {
    let venues = Venues::load()?;
    let around_chicago = |unit| SpatialFilter {
        latitude: 41.8800,
        longitude: -87.6270,
        radius: 7.0,
        unit: Some(unit),
    };

    let miles = venues.search(QueryCriteria::new().with_spatial(around_chicago(DistanceUnit::Miles)), 20)?;
    assert_eq!(sorted_ids(&miles), vec!["andys", "green-mill", "jazz-showcase"]);

    let km = venues.search(
        QueryCriteria::new().with_spatial(around_chicago(DistanceUnit::Kilometers)),
        20,
    )?;
    assert_eq!(sorted_ids(&km), vec!["andys", "jazz-showcase"]);
    Ok(())
}

#[test]
fn test_keywords_within_radius() -> Result<()> {
    let venues = Venues::load()?;
    let criteria = QueryCriteria::keywords("jazz").within(40.7359, -73.9911, 5.0);
    let results = venues.search(criteria, 10)?;
    assert_eq!(results.ids(), vec!["jazz-standard"]);
    Ok(())
}
