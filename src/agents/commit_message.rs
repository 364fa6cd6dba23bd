use crate::version::UpdateKind;

/// Commit message for moving `name` from `old_version` to `new_version`,
/// with a dependency metadata trailer that dependency dashboards understand.
pub fn generate_commit_message(name: &str, old_version: &str, new_version: &str) -> String {
    let update_kind = UpdateKind::between(old_version, new_version);

    format!(
        "Update {name}\n\
         \n\
         Updates {name} to version {new_version}.\n\
         \n\
         ---\n\
         updated-dependencies:\n\
         - dependency-name: {name}\n\
         \x20 dependency-type: direct:production\n\
         \x20 update-type: version-update:semver-{update_kind}\n\
         ...\n\
         \n\
         \n"
    )
}
