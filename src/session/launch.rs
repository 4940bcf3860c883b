use crate::config::CONTAINER_PORT;
use crate::docker::{Mount, PortMapping, RunSpec};

use super::env::container_env;
use super::types::{Session, SessionInput};

/// Where Connect looks for its license file.
pub const LICENSE_TARGET: &str = "/var/lib/rstudio-connect/rstudio-connect.lic";
/// Where Connect looks for its configuration.
pub const CONFIG_TARGET: &str = "/etc/rstudio-connect/rstudio-connect.gcfg";

/// Build the container spec for `session`.
pub fn run_spec(input: &SessionInput, session: &Session) -> RunSpec {
    let mut mounts = vec![Mount {
        source: session.license_path.clone(),
        target: LICENSE_TARGET.to_string(),
    }];
    if let Some(config) = &session.config_path {
        mounts.push(Mount {
            source: config.clone(),
            target: CONFIG_TARGET.to_string(),
        });
    }

    RunSpec {
        image: format!("{}:{}", input.image, session.tag),
        env: container_env(&session.secret, &input.env_overrides),
        mounts,
        ports: vec![PortMapping {
            host: session.port,
            container: CONTAINER_PORT,
        }],
        platform: input.platform.clone(),
        privileged: input.privileged,
    }
}
