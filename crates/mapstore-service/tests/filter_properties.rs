// Property-based tests for DBRP filtering
//
// A record is returned by find_many iff every set filter field equals the
// record field; the empty filter returns everything. A stored mapping reads
// back equal in every field.

use std::sync::Arc;

use mapstore_core::{
    BucketId, CrudService, DbrpMapping, DbrpMappingFilter, FindOptions, MappingId, OrgId,
    Record, RequestContext,
};
use mapstore_service::{DbrpService, RandomIdGenerator};
use mapstore_storage::MemoryKvStore;
use proptest::prelude::*;

// Small value pools so that filters hit often.
const ORGS: [u64; 2] = [0x1000, 0x2000];
const DATABASES: [&str; 3] = ["telegraf", "mydb", "metrics"];
const POLICIES: [&str; 2] = ["autogen", "weekly"];
const CLUSTERS: [&str; 2] = ["", "east"];

fn arb_mapping() -> impl Strategy<Value = DbrpMapping> {
    (
        0usize..2,
        0usize..3,
        0usize..2,
        0usize..2,
        any::<bool>(),
        proptest::option::of(1u64..4),
    )
        .prop_map(|(org, db, rp, cluster, default, bucket)| {
            let mut m = DbrpMapping::new(OrgId::from_u64(ORGS[org]), DATABASES[db], POLICIES[rp]);
            m.cluster = CLUSTERS[cluster].to_string();
            m.default = default;
            m.bucket_id = bucket.map(BucketId::from_u64);
            m
        })
}

fn arb_filter() -> impl Strategy<Value = DbrpMappingFilter> {
    (
        proptest::option::of(0usize..2),
        proptest::option::of(0usize..3),
        proptest::option::of(0usize..2),
        proptest::option::of(0usize..2),
        proptest::option::of(any::<bool>()),
        proptest::option::of(1u64..4),
    )
        .prop_map(|(org, db, rp, cluster, default, bucket)| DbrpMappingFilter {
            id: None,
            org_id: org.map(|i| OrgId::from_u64(ORGS[i])),
            bucket_id: bucket.map(BucketId::from_u64),
            cluster: cluster.map(|i| CLUSTERS[i].to_string()),
            database: db.map(|i| DATABASES[i].to_string()),
            retention_policy: rp.map(|i| POLICIES[i].to_string()),
            default,
        })
}

fn expected(m: &DbrpMapping, f: &DbrpMappingFilter) -> bool {
    f.org_id.map_or(true, |o| o == m.organization_id)
        && f.bucket_id.map_or(true, |b| Some(b) == m.bucket_id)
        && f.cluster.as_ref().map_or(true, |c| *c == m.cluster)
        && f.database.as_ref().map_or(true, |d| *d == m.database)
        && f.retention_policy
            .as_ref()
            .map_or(true, |r| *r == m.retention_policy)
        && f.default.map_or(true, |d| d == m.default)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_find_many_returns_exactly_the_matches(
        records in proptest::collection::vec(arb_mapping(), 0..24),
        filter in arb_filter(),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result: Result<(), TestCaseError> = runtime.block_on(async {
            let svc = DbrpService::new(Arc::new(MemoryKvStore::new()), Arc::new(RandomIdGenerator))
                .await
                .unwrap();
            let ctx = RequestContext::new();

            let mut stored = Vec::with_capacity(records.len());
            for (i, mut m) in records.into_iter().enumerate() {
                m.id = MappingId::from_u64(i as u64 + 1);
                svc.create(&ctx, &mut m).await.unwrap();
                stored.push(m);
            }

            let (found, count) = svc
                .find_many(&ctx, &filter, FindOptions::default())
                .await
                .unwrap();
            let want: Vec<_> = stored.iter().filter(|m| expected(m, &filter)).cloned().collect();

            prop_assert_eq!(count, want.len());
            prop_assert_eq!(&found, &want);
            for m in &found {
                prop_assert!(m.matches(&filter));
            }

            let (everything, total) = svc
                .find_many(&ctx, &DbrpMappingFilter::default(), FindOptions::default())
                .await
                .unwrap();
            prop_assert_eq!(total, stored.len());
            prop_assert_eq!(everything, stored);
            Ok(())
        });
        result?;
    }
}

proptest! {
    #[test]
    fn prop_stored_mapping_reads_back_equal(mut m in arb_mapping(), id in 1u64..u64::MAX) {
        m.id = MappingId::from_u64(id);
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let found = runtime.block_on(async {
            let svc = DbrpService::new(Arc::new(MemoryKvStore::new()), Arc::new(RandomIdGenerator))
                .await
                .unwrap();
            let ctx = RequestContext::new();
            let mut stored = m.clone();
            svc.create(&ctx, &mut stored).await.unwrap();
            svc.find_by_id(&ctx, m.id).await.unwrap()
        });
        prop_assert_eq!(found, m);
    }
}
