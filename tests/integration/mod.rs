mod audit_test;
mod error_test;
mod item_test;
mod json_test;
mod rotate_test;
mod schedule_test;
