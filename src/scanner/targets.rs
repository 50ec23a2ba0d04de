use tracing::{debug, error, info};

use crate::{session::Session, source_control::SourceControl};

/// Resolve each login into a target, one at a time, adding organization members when
/// `expand_orgs` is set. Failures are logged and skipped.
pub fn gather_targets(
    session: &Session,
    client: &dyn SourceControl,
    logins: &[String],
    expand_orgs: bool,
) {
    info!("Gathering targets...");
    for login in logins {
        let target = match client.resolve_account(login) {
            Ok(target) => target,
            Err(e) => {
                error!("Error retrieving information on {login}: {e:#}");
                continue;
            }
        };
        debug!("{} (ID: {}) type: {}", target.login, target.id, target.kind);
        session.add_target(target.clone());

        if !expand_orgs || !target.is_organization() {
            continue;
        }
        debug!("Gathering members of {} (ID: {})...", target.login, target.id);
        match client.list_members(&target) {
            Ok(members) => {
                for member in members {
                    debug!(
                        "Adding organization member {} (ID: {}) to targets",
                        member.login, member.id
                    );
                    session.add_target(member);
                }
            }
            Err(e) => error!("Error retrieving members of {}: {e:#}", target.login),
        }
    }
    info!("Gathered {} targets", session.targets().len());
}
