//! Integration tests for InMemoryRecordService using the storage test harness.
//!
//! This file invokes `record_service_tests!` to validate that
//! InMemoryRecordService fully conforms to the RecordService contract.

#[macro_use]
mod storage_harness;

use recordbook::storage::InMemoryRecordService;
use storage_harness::*;

record_service_tests!(InMemoryRecordService::new(members_schema()));
