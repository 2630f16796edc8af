// ═══════════════════════════════════════════════════════════════════
// Store Tests — MemoryStore behavior, Firestore wire encoding
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use serde_json::json;

use myfinance_core::errors::CoreError;
use myfinance_core::models::record::RawRecord;
use myfinance_core::store::firestore::{
    build_aggregation_query, build_ordered_query, decode_document, decode_number, encode_fields,
    Aggregation,
};
use myfinance_core::store::memory::MemoryStore;
use myfinance_core::store::query::{Collection, DateFilter};
use myfinance_core::store::traits::RemoteStore;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rec(name: &str, price: f64, y: i32, m: u32, day: u32) -> RawRecord {
    RawRecord {
        name: Some(name.into()),
        price: Some(price),
        year: Some(y),
        month: Some(m),
        day: Some(day),
        category: Some("other".into()),
    }
}

fn seeded() -> MemoryStore {
    MemoryStore::new().with_records(
        Collection::Purchases,
        vec![
            rec("a", 3.0, 2024, 5, 10),
            rec("b", 1.0, 2024, 5, 12),
            rec("c", 9.0, 2024, 5, 10),
            rec("d", 100.0, 2023, 12, 31),
        ],
    )
}

fn names(records: &[myfinance_core::models::record::StoredRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.record.name.clone().unwrap_or_default())
        .collect()
}

// ═══════════════════════════════════════════════════════════════════
// Collection / DateFilter
// ═══════════════════════════════════════════════════════════════════

mod query {
    use super::*;
    use myfinance_core::ledger::bucket::Granularity;

    #[test]
    fn collection_ids() {
        assert_eq!(Collection::Purchases.as_str(), "payments");
        assert_eq!(Collection::Incomes.to_string(), "incomes");
        assert_eq!(Collection::Purchases.granularity(), Granularity::Daily);
        assert_eq!(Collection::Incomes.granularity(), Granularity::Yearly);
    }

    #[test]
    fn month_of_and_contains() {
        let filter = DateFilter::month_of(d(2024, 2, 29));
        assert_eq!(
            filter,
            DateFilter::Month {
                year: 2024,
                month: 2
            }
        );
        assert!(filter.contains(d(2024, 2, 1)));
        assert!(!filter.contains(d(2023, 2, 1)));
        assert!(DateFilter::All.contains(d(1999, 1, 1)));
        assert!(DateFilter::Year(2024).contains(d(2024, 12, 31)));
        assert!(!DateFilter::Day(d(2024, 1, 1)).contains(d(2024, 1, 2)));
    }

    #[test]
    fn field_equalities() {
        assert!(DateFilter::All.field_equalities().is_empty());
        assert_eq!(
            DateFilter::Day(d(2024, 5, 7)).field_equalities(),
            vec![("day", 7), ("month", 5), ("year", 2024)]
        );
        assert_eq!(
            DateFilter::Year(2023).field_equalities(),
            vec![("year", 2023)]
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryStore
// ═══════════════════════════════════════════════════════════════════

mod memory {
    use super::*;

    #[tokio::test]
    async fn fetch_is_newest_first_then_price_descending() {
        let store = seeded();
        let batch = store
            .fetch_ordered_batch(Collection::Purchases, 10)
            .await
            .unwrap();
        assert_eq!(names(&batch), vec!["b", "c", "a", "d"]);
    }

    #[tokio::test]
    async fn fetch_respects_limit() {
        let store = seeded();
        let batch = store
            .fetch_ordered_batch(Collection::Purchases, 2)
            .await
            .unwrap();
        assert_eq!(names(&batch), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let store = seeded();
        let incomes = store
            .fetch_ordered_batch(Collection::Incomes, 10)
            .await
            .unwrap();
        assert!(incomes.is_empty());
        assert_eq!(store.count_records(Collection::Incomes).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = store
            .add_record(Collection::Purchases, &rec("a", 1.0, 2024, 1, 1))
            .await
            .unwrap();
        let b = store
            .add_record(Collection::Purchases, &rec("b", 1.0, 2024, 1, 1))
            .await
            .unwrap();
        assert!(!a.is_empty());
        assert_ne!(a, b);
        assert_eq!(store.count_records(Collection::Purchases).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_removes_the_document() {
        let store = seeded();
        let id = store.records(Collection::Purchases)[0].id.clone();
        store
            .delete_record(Collection::Purchases, &id)
            .await
            .unwrap();
        assert_eq!(store.count_records(Collection::Purchases).await.unwrap(), 3);
        assert!(store
            .records(Collection::Purchases)
            .iter()
            .all(|r| r.id != id));
    }

    #[tokio::test]
    async fn delete_missing_is_store_error() {
        let store = seeded();
        let err = store
            .delete_record(Collection::Purchases, "nope")
            .await
            .unwrap_err();
        match err {
            CoreError::Store { backend, message } => {
                assert_eq!(backend, "Memory");
                assert_eq!(message, "No document nope in payments");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_replaces_the_body() {
        let store = seeded();
        let id = store.records(Collection::Purchases)[0].id.clone();
        let new_body = rec("a2", 30.0, 2024, 5, 11);
        store
            .update_record(Collection::Purchases, &id, &new_body)
            .await
            .unwrap();
        let updated = store
            .records(Collection::Purchases)
            .into_iter()
            .find(|r| r.id == id)
            .unwrap();
        assert_eq!(updated.record, new_body);
    }

    #[tokio::test]
    async fn update_missing_is_store_error() {
        let store = MemoryStore::new();
        let result = store
            .update_record(Collection::Incomes, "ghost", &rec("x", 1.0, 2024, 1, 1))
            .await;
        assert!(matches!(result, Err(CoreError::Store { .. })));
    }

    #[tokio::test]
    async fn sums_follow_the_filter() {
        let store = seeded();
        let cases = [
            (DateFilter::All, 113.0),
            (DateFilter::Day(d(2024, 5, 10)), 12.0),
            (DateFilter::month_of(d(2024, 5, 1)), 13.0),
            (DateFilter::Year(2023), 100.0),
            (DateFilter::Year(2020), 0.0),
        ];
        for (filter, expected) in cases {
            let sum = store
                .sum_prices(Collection::Purchases, filter)
                .await
                .unwrap();
            assert_eq!(sum, expected, "filter {filter:?}");
        }
    }

    #[tokio::test]
    async fn budget_defaults_to_zero_and_persists() {
        let store = MemoryStore::new();
        assert_eq!(store.get_monthly_budget().await.unwrap(), 0.0);
        store.set_monthly_budget(750.0).await.unwrap();
        assert_eq!(store.get_monthly_budget().await.unwrap(), 750.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Firestore wire format
// ═══════════════════════════════════════════════════════════════════

mod firestore {
    use super::*;

    #[test]
    fn numbers_decode_from_both_encodings() {
        assert_eq!(decode_number(&json!({ "integerValue": "42" })), Some(42.0));
        assert_eq!(decode_number(&json!({ "integerValue": 7 })), Some(7.0));
        assert_eq!(decode_number(&json!({ "doubleValue": 2.5 })), Some(2.5));
        assert_eq!(decode_number(&json!({ "stringValue": "3" })), None);
    }

    #[test]
    fn encode_uses_typed_values() {
        let body = encode_fields(&rec("Coffee", 3.5, 2024, 5, 10));
        assert_eq!(body["fields"]["name"], json!({ "stringValue": "Coffee" }));
        assert_eq!(body["fields"]["price"], json!({ "doubleValue": 3.5 }));
        assert_eq!(body["fields"]["year"], json!({ "integerValue": "2024" }));
        assert_eq!(body["fields"]["day"], json!({ "integerValue": "10" }));
        assert_eq!(body["fields"]["category"], json!({ "stringValue": "other" }));
    }

    #[test]
    fn encode_omits_absent_fields() {
        let body = encode_fields(&RawRecord {
            name: Some("Salary".into()),
            year: Some(2024),
            ..Default::default()
        });
        let fields = body["fields"].as_object().unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.get("category").is_none());
    }

    #[test]
    fn decode_takes_id_from_document_name() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/purchases/u/payments/AbC123",
            "fields": {
                "name": { "stringValue": "Bus" },
                "price": { "integerValue": "2" },
                "year": { "integerValue": "2024" },
                "month": { "integerValue": "4" },
                "day": { "integerValue": "28" },
            }
        });
        let stored = decode_document(&doc).unwrap();
        assert_eq!(stored.id, "AbC123");
        assert_eq!(stored.record.price, Some(2.0));
        assert_eq!(stored.record.month, Some(4));
        assert_eq!(stored.record.category, None);
    }

    #[test]
    fn encode_then_decode_keeps_the_record() {
        let record = rec("Rent", 700.0, 2024, 6, 1);
        let mut doc = encode_fields(&record);
        doc["name"] = json!("projects/p/databases/(default)/documents/purchases/u/payments/r1");
        assert_eq!(decode_document(&doc).unwrap().record, record);
    }

    #[test]
    fn decode_rejects_nameless_documents() {
        let err = decode_document(&json!({ "fields": {} })).unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn ordered_query_sorts_all_four_fields_descending() {
        let q = build_ordered_query(Collection::Purchases, 50);
        let sq = &q["structuredQuery"];
        assert_eq!(sq["from"][0]["collectionId"], "payments");
        assert_eq!(sq["limit"], 50);

        let order = sq["orderBy"].as_array().unwrap();
        let fields: Vec<&str> = order
            .iter()
            .map(|o| o["field"]["fieldPath"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["year", "month", "day", "price"]);
        assert!(order.iter().all(|o| o["direction"] == "DESCENDING"));
    }

    #[test]
    fn sum_query_for_today_is_a_composite_filter() {
        let q = build_aggregation_query(
            Collection::Purchases,
            DateFilter::Day(d(2024, 5, 10)),
            Aggregation::SumOfPrices,
        );
        let agg = &q["structuredAggregationQuery"];
        assert_eq!(agg["aggregations"][0]["alias"], "total");
        assert_eq!(
            agg["aggregations"][0]["sum"]["field"]["fieldPath"],
            "price"
        );

        let filter = &agg["structuredQuery"]["where"]["compositeFilter"];
        assert_eq!(filter["op"], "AND");
        let filters = filter["filters"].as_array().unwrap();
        assert_eq!(filters.len(), 3);
        assert_eq!(filters[0]["fieldFilter"]["field"]["fieldPath"], "day");
        assert_eq!(filters[0]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(
            filters[0]["fieldFilter"]["value"],
            json!({ "integerValue": "10" })
        );
    }

    #[test]
    fn single_equality_is_a_plain_field_filter() {
        let q = build_aggregation_query(
            Collection::Incomes,
            DateFilter::Year(2024),
            Aggregation::SumOfPrices,
        );
        let where_clause = &q["structuredAggregationQuery"]["structuredQuery"]["where"];
        assert_eq!(where_clause["fieldFilter"]["field"]["fieldPath"], "year");
        assert!(where_clause.get("compositeFilter").is_none());
    }

    #[test]
    fn count_query_has_no_where_clause() {
        let q = build_aggregation_query(Collection::Incomes, DateFilter::All, Aggregation::Count);
        let agg = &q["structuredAggregationQuery"];
        assert_eq!(agg["structuredQuery"]["from"][0]["collectionId"], "incomes");
        assert!(agg["structuredQuery"].get("where").is_none());
        assert_eq!(agg["aggregations"][0]["alias"], "count");
        assert!(agg["aggregations"][0]["count"].is_object());
    }
}
