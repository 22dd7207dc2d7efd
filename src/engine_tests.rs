#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::catalog::ClusterCatalog;
    use crate::cluster::{CentroidModel, ClusterId};
    use crate::config::EngineConfig;
    use crate::engine::{ArtifactSource, MatchContext, SharedModel};
    use crate::schema::{Attribute, AttributeRecord, Schema, UNKNOWN};
    use crate::{Error, Result, Severity};

    const MODEL: &str = r#"{"clusters": [
        {"id": "Cluster 0", "weights": {"gender": {"Kobieta": 1.0}, "fav_place": {"W górach": 1.0}}},
        {"id": "Cluster 1", "weights": {"gender": {"Mężczyzna": 1.0}, "fav_place": {"Nad wodą": 1.0}}},
        {"id": "Cluster 2", "weights": {"age": {"unknown": 1.0}, "edu_level": {"Podstawowe": 1.0}}},
        {"id": "Cluster 3", "weights": {"fav_animals": {"Koty": 1.0}, "fav_place": {"W lesie": 1.0}}}
    ]}"#;

    const CATALOG: &str = r#"{
        "Cluster 0": {"name": "Górskie wędrowniczki", "description": "Kobiety, które najlepiej czują się w górach."},
        "Cluster 1": {"name": "Wodniacy", "description": "Mężczyźni spędzający czas nad wodą."},
        "Cluster 2": {"name": "Tajemniczy", "description": "Wolą nie podawać wieku."},
        "Cluster 3": {"name": "Leśne koty", "description": "Kociarze z zamiłowaniem do lasu."}
    }"#;

    /// In-memory source counting how often each artifact is loaded.
    struct MemorySource {
        model_json: Option<String>,
        catalog: ClusterCatalog,
        raw: Vec<AttributeRecord>,
        strict: bool,
        /// Fail this many model loads before succeeding.
        model_failures: AtomicUsize,
        model_loads: AtomicUsize,
        catalog_loads: AtomicUsize,
        population_loads: AtomicUsize,
    }

    impl MemorySource {
        fn new(raw: Vec<AttributeRecord>) -> Self {
            Self {
                model_json: Some(MODEL.to_string()),
                catalog: ClusterCatalog::from_json_str(CATALOG).unwrap(),
                raw,
                strict: true,
                model_failures: AtomicUsize::new(0),
                model_loads: AtomicUsize::new(0),
                catalog_loads: AtomicUsize::new(0),
                population_loads: AtomicUsize::new(0),
            }
        }

        fn loads(&self) -> (usize, usize, usize) {
            (
                self.model_loads.load(Ordering::SeqCst),
                self.catalog_loads.load(Ordering::SeqCst),
                self.population_loads.load(Ordering::SeqCst),
            )
        }
    }

    impl ArtifactSource for MemorySource {
        fn load_model(&self, schema: &Schema) -> Result<SharedModel> {
            self.model_loads.fetch_add(1, Ordering::SeqCst);
            if self
                .model_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(Error::model("artifact not yet published"));
            }
            let json = self
                .model_json
                .as_deref()
                .ok_or_else(|| Error::model("no model artifact"))?;
            let model =
                CentroidModel::from_json_str(schema.clone(), json)?.with_strict_validation(self.strict);
            Ok(Box::new(model))
        }

        fn load_catalog(&self) -> Result<ClusterCatalog> {
            self.catalog_loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.catalog.clone())
        }

        fn load_raw_population(&self) -> Result<Vec<AttributeRecord>> {
            self.population_loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.raw.clone())
        }
    }

    /// Every (age, gender, place) combination, with edu and animals cycling.
    fn survey_population() -> Vec<AttributeRecord> {
        let schema = Schema::survey();
        let edu = schema.domain(Attribute::EduLevel);
        let animals = schema.domain(Attribute::FavAnimals);
        let mut out = Vec::new();
        let mut i = 0;
        for age in schema.domain(Attribute::Age) {
            for gender in schema.domain(Attribute::Gender) {
                for place in schema.domain(Attribute::FavPlace) {
                    out.push(AttributeRecord::new(
                        age.clone(),
                        edu[i % edu.len()].clone(),
                        animals[i % animals.len()].clone(),
                        place.clone(),
                        gender.clone(),
                    ));
                    i += 1;
                }
            }
        }
        out
    }

    fn respondent() -> AttributeRecord {
        AttributeRecord::new("25-34", "Wyższe", "Koty i Psy", "W górach", "Kobieta")
    }

    #[test]
    fn test_end_to_end_match() -> Result<()> {
        let raw = survey_population();
        let context = MatchContext::new(MemorySource::new(raw.clone()));

        let matched = context.match_respondent(&respondent())?;
        assert!(!matched.metadata.name.is_empty());
        assert!(!matched.metadata.description.is_empty());
        assert_eq!(matched.cluster_id, ClusterId::from("Cluster 0"));

        let model = context.model()?;
        let expected = raw
            .iter()
            .filter(|r| model.assign(r).unwrap() == matched.cluster_id)
            .count();
        assert!(expected > 0);
        assert_eq!(matched.aggregate.member_count(), expected);

        for a in Attribute::ALL {
            let total: usize = matched.aggregate.distribution(a).values().sum();
            assert_eq!(total, expected);
        }
        Ok(())
    }

    #[test]
    fn test_forty_sixty_split() -> Result<()> {
        let mut raw = Vec::new();
        for i in 0..100 {
            let (gender, place) = if i < 40 {
                ("Kobieta", "W górach")
            } else {
                ("Mężczyzna", "Nad wodą")
            };
            raw.push(AttributeRecord::new("35-44", "Średnie", "Psy", place, gender));
        }
        let context = MatchContext::new(MemorySource::new(raw));

        let women = context.match_respondent(&respondent())?;
        let men = context.match_respondent(&AttributeRecord::new(
            "45-54", "Wyższe", "Inne", "Nad wodą", "Mężczyzna",
        ))?;

        assert_ne!(women.cluster_id, men.cluster_id);
        assert_eq!(women.aggregate.member_count(), 40);
        assert_eq!(men.aggregate.member_count(), 60);
        assert_eq!(
            women.aggregate.member_count() + men.aggregate.member_count(),
            100
        );
        assert_eq!(women.aggregate.count(Attribute::Gender, "Kobieta"), 40);
        Ok(())
    }

    #[test]
    fn test_unknown_age_matches() -> Result<()> {
        let context = MatchContext::new(MemorySource::new(survey_population()));
        let r = AttributeRecord::new(UNKNOWN, "Podstawowe", "Inne", "Inne", "Mężczyzna");

        let matched = context.match_respondent(&r)?;
        assert_eq!(matched.cluster_id, ClusterId::from("Cluster 2"));
        assert!(context.catalog()?.contains(&matched.cluster_id));
        Ok(())
    }

    #[test]
    fn test_empty_cluster_is_not_an_error() -> Result<()> {
        // Nobody in the population likes cats in the forest.
        let raw = vec![AttributeRecord::new("25-34", "Wyższe", "Psy", "W górach", "Kobieta")];
        let context = MatchContext::new(MemorySource::new(raw));

        let r = AttributeRecord::new("18-24", "Średnie", "Koty", "W lesie", "Mężczyzna");
        let matched = context.match_respondent(&r)?;
        assert_eq!(matched.cluster_id, ClusterId::from("Cluster 3"));
        assert_eq!(matched.aggregate.member_count(), 0);
        assert!(matched.aggregate.distribution(Attribute::Age).is_empty());
        Ok(())
    }

    #[test]
    fn test_catalog_covers_population() -> Result<()> {
        let context = MatchContext::new(MemorySource::new(survey_population()));
        let catalog = context.catalog()?;
        for member in context.population()?.records() {
            assert!(catalog.describe(&member.cluster).is_ok());
        }
        Ok(())
    }

    #[test]
    fn test_missing_catalog_entry_is_unknown_cluster() {
        let mut source = MemorySource::new(survey_population());
        source.catalog = ClusterCatalog::new(
            source
                .catalog
                .iter()
                .filter(|(id, _)| id.as_str() != "Cluster 0")
                .map(|(id, meta)| (id.clone(), meta.clone())),
        );
        let context = MatchContext::new(source);

        let err = context.match_respondent(&respondent()).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownCluster {
                id: ClusterId::from("Cluster 0")
            }
        );

        let report = context.health_check().unwrap();
        assert!(!report.is_healthy());
        assert_eq!(report.issues_at_level(Severity::Critical).len(), 1);
    }

    #[test]
    fn test_missing_model_is_model_unavailable() {
        let mut source = MemorySource::new(survey_population());
        source.model_json = None;
        let context = MatchContext::new(source);

        let err = context.match_respondent(&respondent()).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable { .. }));
        assert!(matches!(
            context.population().unwrap_err(),
            Error::ModelUnavailable { .. }
        ));
        assert!(matches!(context.preload(), Err(Error::ModelUnavailable { .. })));
    }

    #[test]
    fn test_failed_load_is_retried() -> Result<()> {
        let source = MemorySource::new(survey_population());
        source.model_failures.store(1, Ordering::SeqCst);
        let context = MatchContext::new(source);

        assert!(context.model().is_err());
        assert!(context.match_respondent(&respondent()).is_ok());
        assert_eq!(context.source().loads().0, 2);
        Ok(())
    }

    #[test]
    fn test_unlabelable_population_is_data_unavailable() {
        let mut raw = survey_population();
        raw.push(AttributeRecord::new("25-34", "Wyższe", "Psy", "Na Marsie", "Kobieta"));
        let context = MatchContext::new(MemorySource::new(raw));

        assert!(context.model().is_ok());
        let err = context.match_respondent(&respondent()).unwrap_err();
        assert!(matches!(err, Error::DataUnavailable { .. }));
    }

    #[test]
    fn test_strict_validation_rejects_out_of_domain_respondent() {
        let context = MatchContext::new(MemorySource::new(survey_population()));
        let r = AttributeRecord::new("25-34", "Wyższe", "Koty i Psy", "W górach", "Inna");

        let err = context.match_respondent(&r).unwrap_err();
        assert_eq!(
            err,
            Error::SchemaViolation {
                attribute: Attribute::Gender,
                value: "Inna".to_string(),
            }
        );
    }

    #[test]
    fn test_lenient_validation_still_assigns_valid_cluster() -> Result<()> {
        let mut source = MemorySource::new(survey_population());
        source.strict = false;
        let context = MatchContext::new(source);
        let r = AttributeRecord::new("25-34", "Wyższe", "Koty i Psy", "W górach", "Inna");

        let matched = context.match_respondent(&r)?;
        assert!(context.model()?.cluster_ids().contains(&matched.cluster_id));
        Ok(())
    }

    #[test]
    fn test_repeated_matches_load_once() -> Result<()> {
        let context = MatchContext::new(MemorySource::new(survey_population()));
        context.preload()?;
        for _ in 0..5 {
            context.match_respondent(&respondent())?;
        }
        assert_eq!(context.source().loads(), (1, 1, 1));
        Ok(())
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let context = MatchContext::new(MemorySource::new(survey_population()));

        let ids: Vec<ClusterId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| context.match_respondent(&respondent()).unwrap().cluster_id))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(context.source().loads(), (1, 1, 1));
    }

    #[test]
    fn test_match_serializes_and_splits() -> Result<()> {
        let context = MatchContext::new(MemorySource::new(survey_population()));
        let matched = context.match_respondent(&respondent())?;

        let json = serde_json::to_value(&matched).unwrap();
        assert_eq!(json["cluster_id"], "Cluster 0");
        assert_eq!(json["metadata"]["name"], "Górskie wędrowniczki");

        let count = matched.aggregate.member_count();
        let (meta, agg) = matched.into_parts();
        assert_eq!(meta.name, "Górskie wędrowniczki");
        assert_eq!(agg.member_count(), count);
        Ok(())
    }

    #[test]
    fn test_file_backed_context() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let catalog_path = dir.path().join("catalog.json");
        let population_path = dir.path().join("population.csv");
        std::fs::write(&model_path, MODEL).unwrap();
        std::fs::write(&catalog_path, CATALOG).unwrap();
        std::fs::write(
            &population_path,
            "age;edu_level;fav_animals;fav_place;gender;Cluster\n\
             25-34;Wyższe;Koty;W górach;Kobieta;Cluster 3\n\
             18-24;Średnie;Psy;W górach;Kobieta;Cluster 3\n\
             45-54;Wyższe;Psy;Nad wodą;Mężczyzna;Cluster 0\n",
        )
        .unwrap();

        let config = EngineConfig::default()
            .with_model_path(&model_path)
            .with_catalog_path(&catalog_path)
            .with_population_path(&population_path);
        let context = MatchContext::from_config(config)?;
        context.preload()?;

        let matched = context.match_respondent(&respondent())?;
        assert_eq!(matched.cluster_id, ClusterId::from("Cluster 0"));
        assert_eq!(matched.aggregate.member_count(), 2);
        assert_eq!(matched.aggregate.count(Attribute::Age, "18-24"), 1);
        Ok(())
    }

    #[test]
    fn test_skipped_answers_in_population_still_match() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let catalog_path = dir.path().join("catalog.json");
        let population_path = dir.path().join("population.csv");
        std::fs::write(&model_path, MODEL).unwrap();
        std::fs::write(&catalog_path, CATALOG).unwrap();
        std::fs::write(
            &population_path,
            "age;edu_level;fav_animals;fav_place;gender\n\
             25-34;Wyższe;;W górach;Kobieta\n\
             35-44;Średnie;Psy;W górach;\n\
             45-54;;\"Psy\";Nad wodą;Mężczyzna\n",
        )
        .unwrap();

        let config = EngineConfig::default()
            .with_model_path(&model_path)
            .with_catalog_path(&catalog_path)
            .with_population_path(&population_path);
        let context = MatchContext::from_config(config)?;
        assert_eq!(context.model()?.n_clusters(), 4);
        context.preload()?;
        assert_eq!(context.population()?.len(), 3);

        let matched = context.match_respondent(&respondent())?;
        assert_eq!(matched.cluster_id, ClusterId::from("Cluster 0"));
        assert_eq!(matched.aggregate.member_count(), 2);
        assert_eq!(matched.aggregate.count(Attribute::FavAnimals, UNKNOWN), 1);
        assert_eq!(matched.aggregate.count(Attribute::Gender, UNKNOWN), 1);

        // Respondents are still held to the schema.
        let r = AttributeRecord::new("25-34", "Wyższe", "Psy", "W górach", "Inna");
        assert!(matches!(
            context.match_respondent(&r),
            Err(Error::SchemaViolation {
                attribute: Attribute::Gender,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_file_backed_context_missing_population() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        std::fs::write(&model_path, MODEL).unwrap();

        let config = EngineConfig::default()
            .with_model_path(&model_path)
            .with_population_path(dir.path().join("absent.csv"));
        let context = MatchContext::from_config(config).unwrap();

        assert!(context.model().is_ok());
        assert!(matches!(
            context.population().unwrap_err(),
            Error::DataUnavailable { .. }
        ));
    }
}
