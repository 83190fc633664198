//! Operation handlers, one module per object family.
//!
//! Top-level handlers take the remaining words; entity handlers also take
//! the resolved target users.

pub mod aliases;
pub mod audit;
pub mod calendar;
pub mod domain;
pub mod email;
pub mod groups;
pub mod oauth;
pub mod orgs;
pub mod print;
pub mod profiles;
pub mod report;
pub mod resources;
pub mod users;
pub mod version;

use crate::command::Context;
use crate::error::{GamError, GamResult};
use crate::validation::user_and_domain;

pub(crate) fn unknown_argument(arg: &str, command: &str) -> GamError {
    GamError::usage(format!("Error: {} is not a valid argument for \"{}\"", arg, command))
}

/// Prints a provider rejection and carries on; anything else is returned.
pub(crate) fn print_remote_error(err: GamError) -> GamResult<()> {
    match err {
        GamError::Api(api) => {
            eprintln!("Error: {} - {}", api.reason, api.body);
            Ok(())
        }
        other => Err(other),
    }
}

/// [`print_remote_error`] naming the user the call was for.
pub(crate) fn print_user_error(name: &str, domain: &str, err: GamError) -> GamResult<()> {
    match err {
        GamError::Api(api) => {
            eprintln!("Error for {}@{}: {} - {}", name, domain, api.body, api.reason);
            Ok(())
        }
        other => Err(other),
    }
}

/// Whether `user` has accepted the provider's terms of service.
pub(crate) async fn has_agreed_to_terms(ctx: &Context<'_>, user: &str) -> GamResult<bool> {
    let (name, domain) = user_and_domain(user, ctx.session.domain());
    let entry = ctx.session.provisioning().retrieve_user(&domain, &name).await?;
    Ok(entry.agreed_to_terms != Some(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn remote_errors_are_printed_others_returned() {
        assert!(print_remote_error(ApiError::new(400, "EntityDoesNotExist").into()).is_ok());
        let usage = GamError::usage("Error: expected a user");
        assert_eq!(print_remote_error(usage).unwrap_err().exit_code(), 2);
        assert!(print_user_error("jsmith", "example.com", ApiError::new(403, "Forbidden").into()).is_ok());
    }

    #[test]
    fn unknown_arguments_are_usage_errors() {
        let err = unknown_argument("colour", "gam print users");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("colour"));
    }
}
