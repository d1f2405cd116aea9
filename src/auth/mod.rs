//! Gateway-trust authentication seam.
//!
//! Authentication and RBAC live in the upstream API gateway. By the time a
//! request reaches this service it carries the authenticated organisation,
//! actor, and pre-checked permission strings as trusted headers. This module
//! extracts that context and gates routes on the expected permission; it
//! never verifies tokens itself.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::{self, Next},
    response::IntoResponse,
    Router,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;

pub const HEADER_ORGANISATION_ID: &str = "x-organisation-id";
pub const HEADER_ACTOR_ID: &str = "x-actor-id";
pub const HEADER_PERMISSIONS: &str = "x-permissions";

/// Permission strings checked by the gateway and asserted per route.
pub mod consts {
    pub const INVENTORY_VIEW: &str = "inventory:view:any";
    pub const INVENTORY_EDIT: &str = "inventory:edit:any";
}

/// Authenticated request context: which organisation's ledger is being
/// addressed and which actor is journaled on movements.
#[derive(Clone, Debug)]
pub struct OrgContext {
    pub organisation_id: Uuid,
    pub actor_id: Uuid,
    permissions: Arc<HashSet<String>>,
}

impl OrgContext {
    pub fn new(organisation_id: Uuid, actor_id: Uuid, permissions: Vec<String>) -> Self {
        Self {
            organisation_id,
            actor_id,
            permissions: Arc::new(permissions.into_iter().collect()),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ServiceError> {
        let organisation_id = parse_uuid_header(headers, HEADER_ORGANISATION_ID)?;
        let actor_id = parse_uuid_header(headers, HEADER_ACTOR_ID)?;

        let permissions: Vec<String> = headers
            .get(HEADER_PERMISSIONS)
            .and_then(|v| v.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self::new(organisation_id, actor_id, permissions))
    }
}

fn parse_uuid_header(headers: &HeaderMap, name: &str) -> Result<Uuid, ServiceError> {
    let value = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ServiceError::Forbidden(format!("Missing gateway identity header {}", name))
        })?;
    Uuid::parse_str(value)
        .map_err(|_| ServiceError::Forbidden(format!("Malformed gateway identity header {}", name)))
}

/// Adds permission gating to a router subtree.
pub trait AuthRouterExt {
    fn with_permission(self, permission: &'static str) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_permission(self, permission: &'static str) -> Self {
        self.layer(middleware::from_fn(
            move |mut req: Request, next: Next| async move {
                match OrgContext::from_headers(req.headers()) {
                    Ok(ctx) if ctx.has_permission(permission) => {
                        req.extensions_mut().insert(ctx);
                        next.run(req).await
                    }
                    Ok(_) => ServiceError::Forbidden(format!(
                        "Missing permission {}",
                        permission
                    ))
                    .into_response(),
                    Err(err) => err.into_response(),
                }
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(org: &str, actor: &str, perms: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(HEADER_ORGANISATION_ID, HeaderValue::from_str(org).unwrap());
        map.insert(HEADER_ACTOR_ID, HeaderValue::from_str(actor).unwrap());
        map.insert(HEADER_PERMISSIONS, HeaderValue::from_str(perms).unwrap());
        map
    }

    #[test]
    fn parses_trusted_headers() {
        let org = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let ctx = OrgContext::from_headers(&headers(
            &org.to_string(),
            &actor.to_string(),
            "inventory:view:any, inventory:edit:any",
        ))
        .unwrap();

        assert_eq!(ctx.organisation_id, org);
        assert_eq!(ctx.actor_id, actor);
        assert!(ctx.has_permission(consts::INVENTORY_VIEW));
        assert!(ctx.has_permission(consts::INVENTORY_EDIT));
        assert!(!ctx.has_permission("inventory:delete:any"));
    }

    #[test]
    fn missing_identity_header_is_forbidden() {
        let err = OrgContext::from_headers(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[test]
    fn malformed_uuid_is_forbidden() {
        let err = OrgContext::from_headers(&headers(
            "not-a-uuid",
            &Uuid::new_v4().to_string(),
            "",
        ))
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
