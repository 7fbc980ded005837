//! Integration tests for davsync-sync
//!
//! Drive the ensurer, orchestrator and scheduler against an in-memory
//! remote storage with call recording and fault injection.


mod test_dir_ensurer;
mod test_end_to_end;
mod test_scheduler;
