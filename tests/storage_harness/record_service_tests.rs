//! Macro-generated test suite for the `RecordService` contract
//!
//! The `record_service_tests!` macro generates a test module that checks any
//! `RecordService` built over [`members_schema`](super::members_schema):
//! CRUD, uniqueness, the query pipeline, stats and concurrent access.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use recordbook::storage::InMemoryRecordService;
//!
//! record_service_tests!(InMemoryRecordService::new(members_schema()));
//! ```

/// Generate a full `RecordService` conformance test suite.
///
/// `$factory` must be an expression, evaluated inside an async test, that
/// yields an empty service over `members_schema()`. It is re-evaluated for
/// each test. For the concurrent access test, the service must also
/// implement `Clone + 'static`.
#[macro_export]
macro_rules! record_service_tests {
    ($factory:expr) => {
        mod record_service_contract_tests {
            use super::*;
            use recordbook::prelude::*;

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_and_get() {
                let service = $factory;

                let created = service
                    .create(member("  Alice  ", "Alice@Test.com", 30, 4.5, true))
                    .await
                    .unwrap();
                let id = created.id().expect("created record has an id");

                assert_eq!(text(&created, "name"), Some("Alice"));
                assert_eq!(text(&created, "email"), Some("alice@test.com"));
                assert_eq!(created.created_at(), created.updated_at());

                let keys: Vec<&str> = created.iter().map(|(k, _)| k).collect();
                assert_eq!(keys.first(), Some(&"id"));
                assert_eq!(keys.last(), Some(&"updated_at"));

                let fetched = service.get(&id).await.unwrap().expect("record exists");
                assert_eq!(fetched.id(), Some(id));
                assert_eq!(text(&fetched, "name"), Some("Alice"));
                assert_eq!(number(&fetched, "age"), Some(30.0));
                assert_eq!(number(&fetched, "score"), Some(4.5));
                assert_eq!(fetched.get("active").and_then(FieldValue::as_bool), Some(true));
                assert!(fetched.get("joined").and_then(FieldValue::as_date).is_some());
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let service = $factory;
                assert!(service.get(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_in_insertion_order() {
                let service = $factory;
                assert!(service.list().await.unwrap().is_empty());

                for payload in sample_batch(5) {
                    service.create(payload).await.unwrap();
                }

                let all = service.list().await.unwrap();
                assert_eq!(
                    names(&all),
                    vec!["Member 0", "Member 1", "Member 2", "Member 3", "Member 4"]
                );
                assert_eq!(service.count().await.unwrap(), 5);
            }

            #[tokio::test]
            async fn test_update_is_partial() {
                let service = $factory;
                let created = service
                    .create(member("Bob", "bob@test.com", 40, 2.0, false))
                    .await
                    .unwrap();
                let id = created.id().unwrap();
                let stored = service.get(&id).await.unwrap().unwrap();

                let updated = service
                    .update(&id, json!({ "age": 41, "active": true }))
                    .await
                    .unwrap();
                assert_eq!(number(&updated, "age"), Some(41.0));
                assert_eq!(text(&updated, "name"), Some("Bob"));
                assert_eq!(updated.created_at(), stored.created_at());
                assert!(updated.updated_at() >= stored.updated_at());

                let fetched = service.get(&id).await.unwrap().unwrap();
                assert_eq!(number(&fetched, "age"), Some(41.0));
                assert_eq!(fetched.get("active").and_then(FieldValue::as_bool), Some(true));
                assert_eq!(text(&fetched, "email"), Some("bob@test.com"));
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let service = $factory;
                let err = service
                    .update(&Uuid::new_v4(), json!({ "age": 1 }))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err.downcast_ref::<RecordError>(),
                    Some(RecordError::NotFound { .. })
                ));
            }

            #[tokio::test]
            async fn test_update_rejects_invalid_changes() {
                let service = $factory;
                let created = service
                    .create(member("Cleo", "cleo@test.com", 22, 1.0, true))
                    .await
                    .unwrap();
                let id = created.id().unwrap();

                let err = service
                    .update(&id, json!({ "age": -3, "email": "nope" }))
                    .await
                    .unwrap_err();
                let err = err.downcast::<ValidationError>().unwrap();
                assert_eq!(err.fields(), vec!["email", "age"]);

                let fetched = service.get(&id).await.unwrap().unwrap();
                assert_eq!(number(&fetched, "age"), Some(22.0));
            }

            #[tokio::test]
            async fn test_delete() {
                let service = $factory;
                let created = service
                    .create(member("Dana", "dana@test.com", 35, 3.0, true))
                    .await
                    .unwrap();
                let id = created.id().unwrap();

                service.delete(&id).await.unwrap();
                assert!(service.get(&id).await.unwrap().is_none());

                let err = service.delete(&id).await.unwrap_err();
                assert!(matches!(
                    err.downcast_ref::<RecordError>(),
                    Some(RecordError::NotFound { .. })
                ));
            }

            // ==================================================================
            // Uniqueness
            // ==================================================================

            #[tokio::test]
            async fn test_duplicate_unique_value() {
                let service = $factory;
                service
                    .create(member("Eve", "eve@test.com", 28, 2.5, true))
                    .await
                    .unwrap();

                // The lowercase filter runs before the uniqueness check
                let err = service
                    .create(member("Eve Two", "EVE@test.com", 29, 2.5, true))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err.downcast_ref::<RecordError>(),
                    Some(RecordError::DuplicateKey { field, .. }) if field == "email"
                ));
                assert_eq!(service.count().await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_update_into_duplicate() {
                let service = $factory;
                service
                    .create(member("Finn", "finn@test.com", 28, 2.5, true))
                    .await
                    .unwrap();
                let gwen = service
                    .create(member("Gwen", "gwen@test.com", 31, 3.5, false))
                    .await
                    .unwrap();
                let id = gwen.id().unwrap();

                let err = service
                    .update(&id, json!({ "email": "finn@test.com" }))
                    .await
                    .unwrap_err();
                assert!(err.downcast_ref::<RecordError>().is_some());

                // Keeping its own value is not a conflict
                service
                    .update(&id, json!({ "email": "gwen@test.com", "age": 32 }))
                    .await
                    .unwrap();
            }

            // ==================================================================
            // Query pipeline
            // ==================================================================

            async fn seeded() -> impl RecordService {
                let service = $factory;
                for payload in [
                    member("John Doe", "john@test.com", 30, 85.0, true),
                    member("Jane Smith", "jane@test.com", 25, 92.0, true),
                    member("Bob Johnson", "bob@test.com", 41, 78.0, false),
                    member("Maria Parker", "maria@test.com", 25, 88.0, true),
                    json!({ "name": "Zed", "email": "zed@test.com" }),
                ] {
                    service.create(payload).await.unwrap();
                }
                service
            }

            #[tokio::test]
            async fn test_query_sort_and_paginate() {
                let service = seeded().await;

                let query = QueryDescriptor::new()
                    .sort_by("score", SortDirection::Descending)
                    .page(1, 2);
                let result = service.query(&query).await.unwrap();
                assert_eq!(names(&result.items), vec!["Jane Smith", "Maria Parker"]);
                assert_eq!(result.total_matched, 5);
                assert_eq!(result.total_pages, 3);

                let last = service.query(&query.clone().page(3, 2)).await.unwrap();
                assert_eq!(names(&last.items), vec!["Zed"]);

                let beyond = service.query(&query.page(4, 2)).await.unwrap();
                assert!(beyond.items.is_empty());
                assert_eq!(beyond.total_matched, 5);
            }

            #[tokio::test]
            async fn test_query_missing_values_sort_lowest() {
                let service = seeded().await;

                let query = QueryDescriptor::new().sort_by("age", SortDirection::Ascending);
                let result = service.query(&query).await.unwrap();
                assert_eq!(
                    names(&result.items),
                    vec!["Zed", "Jane Smith", "Maria Parker", "John Doe", "Bob Johnson"]
                );
            }

            #[tokio::test]
            async fn test_query_search() {
                let service = seeded().await;

                let query = QueryDescriptor::new().search("JO", ["name", "email"]);
                let result = service.query(&query).await.unwrap();
                assert_eq!(names(&result.items), vec!["John Doe", "Bob Johnson"]);
            }

            #[tokio::test]
            async fn test_query_filters() {
                let service = seeded().await;

                let query = QueryDescriptor::new()
                    .filter_eq("active", true)
                    .filter_eq("age", 25.0)
                    .sort_by("name", SortDirection::Ascending);
                let result = service.query(&query).await.unwrap();
                assert_eq!(names(&result.items), vec!["Jane Smith", "Maria Parker"]);

                let query = QueryDescriptor::new()
                    .filter_min("score", 80.0)
                    .filter_max("score", 90.0);
                let result = service.query(&query).await.unwrap();
                assert_eq!(names(&result.items), vec!["John Doe", "Maria Parker"]);
            }

            #[tokio::test]
            async fn test_query_filter_type_mismatch_matches_nothing() {
                let service = seeded().await;

                let query = QueryDescriptor::new().filter_eq("age", "25");
                let result = service.query(&query).await.unwrap();
                assert_eq!(result.total_matched, 0);

                let query = QueryDescriptor::new().filter_eq("nickname", "JD");
                let result = service.query(&query).await.unwrap();
                assert_eq!(result.total_matched, 0);
            }

            #[tokio::test]
            async fn test_query_rejects_page_zero() {
                let service = seeded().await;
                let err = service
                    .query(&QueryDescriptor::new().page(0, 10))
                    .await
                    .unwrap_err();
                assert!(err.downcast_ref::<QueryError>().is_some());
            }

            #[tokio::test]
            async fn test_stats() {
                let service = seeded().await;

                let stats = service
                    .stats(&StatsRequest::new("active").average("score"))
                    .await
                    .unwrap();
                assert_eq!(stats.len(), 3);
                assert_eq!(stats[0].key, Some(FieldValue::Boolean(true)));
                assert_eq!(stats[0].count, 3);
                assert_eq!(stats[0].average, Some((85.0 + 92.0 + 88.0) / 3.0));
                assert_eq!(stats[2].key, None);
                assert_eq!(stats[2].average, None);
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_concurrent_access() {
                let service = $factory;
                let mut handles = Vec::new();

                for payload in sample_batch(10) {
                    let service = service.clone();
                    handles.push(tokio::spawn(async move { service.create(payload).await }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }

                assert_eq!(service.count().await.unwrap(), 10);
                let result = service
                    .query(&QueryDescriptor::new().sort_by("age", SortDirection::Ascending))
                    .await
                    .unwrap();
                assert_eq!(result.items.len(), 10);
                assert_eq!(number(&result.items[0], "age"), Some(20.0));
            }

            #[tokio::test]
            async fn test_concurrent_duplicates_store_one() {
                let service = $factory;
                let mut handles = Vec::new();

                for i in 0..8 {
                    let service = service.clone();
                    let payload = member(&format!("Twin {i}"), "twin@test.com", 30, 1.0, true);
                    handles.push(tokio::spawn(async move { service.create(payload).await }));
                }

                let mut created = 0;
                for handle in handles {
                    match handle.await.unwrap() {
                        Ok(_) => created += 1,
                        Err(err) => assert!(matches!(
                            err.downcast_ref::<RecordError>(),
                            Some(RecordError::DuplicateKey { field, .. }) if field == "email"
                        )),
                    }
                }

                assert_eq!(created, 1);
                assert_eq!(service.count().await.unwrap(), 1);
            }
        }
    };
}
