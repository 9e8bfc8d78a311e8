// SPDX-License-Identifier: MIT

use super::socket_path;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn socket_path_defaults_when_unset() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::remove_var("ASSIGNER_DB_PATH");
    assert_eq!(socket_path(), std::path::PathBuf::from("./assigner.sock"));
}

#[test]
fn socket_path_swaps_the_db_extension_for_sock() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("ASSIGNER_DB_PATH", "/var/lib/aac/fleet.db");
    assert_eq!(socket_path(), std::path::PathBuf::from("/var/lib/aac/fleet.sock"));
    std::env::remove_var("ASSIGNER_DB_PATH");
}
