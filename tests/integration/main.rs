//! Integration tests over the assembled HTTP app and in-memory stores.

mod api_test;
mod helpers;
mod pipeline_test;
mod realtime_test;
