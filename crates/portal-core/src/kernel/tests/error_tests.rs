use std::io;
use std::path::PathBuf;

use crate::kernel::error::Error;
use crate::orders::OrderError;
use crate::orders::error::{ERR_MISSING_REQUIRED_FIELD, ERR_PERSISTENCE};
use crate::storage::StorageSystemError;
use crate::worker::WorkerError;

#[test]
fn test_codes_follow_the_wrapped_error() {
    let missing: Error = OrderError::MissingRequiredField("server_name".to_string()).into();
    assert_eq!(missing.code(), Some(ERR_MISSING_REQUIRED_FIELD));

    let io_failure = Error::io(
        io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        "read_file",
        PathBuf::from("/data/store.json"),
    );
    assert_eq!(io_failure.code(), Some(ERR_PERSISTENCE));
    assert!(matches!(
        io_failure,
        Error::StorageSystem(StorageSystemError::Io { ref operation, .. }) if operation == "read_file"
    ));

    let worker: Error = WorkerError::InvalidJobId("a b".to_string()).into();
    assert_eq!(worker.code(), None);
}

#[test]
fn test_message_conversions() {
    let err: Error = "no plugins directory".into();
    assert_eq!(err.to_string(), "Error: no plugins directory");
    let err: Error = format!("{} failed", "load").into();
    assert!(matches!(err, Error::Other(ref msg) if msg == "load failed"));
}
