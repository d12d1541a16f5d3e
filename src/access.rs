use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ConfigError;

/// Role
///
/// The closed set of marketplace roles. Every role owns exactly one entry in the
/// route policy table; `RolePatterns::for_role` matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Tenant,
    Landlord,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "tenant" => Some(Role::Tenant),
            "landlord" => Some(Role::Landlord),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tenant => "tenant",
            Role::Landlord => "landlord",
            Role::Admin => "admin",
        }
    }
}

/// Principal
///
/// The resolved identity behind a session token. `role` is `None` when the identity
/// service reports a role outside the known set: such a principal is authenticated
/// but permitted nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    pub id: String,
    pub role: Option<Role>,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: &str) -> Self {
        Self {
            id: id.into(),
            role: Role::parse(role),
        }
    }

    /// True when the principal holds one of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role.is_some_and(|role| roles.contains(&role))
    }
}

/// AccessDecision
///
/// Terminal outcome of a single gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToLogin { redirect_path: String },
    RedirectToHome,
}

/// RolePatterns
///
/// Per-role ordered path matchers.
#[derive(Debug, Clone)]
pub struct RolePatterns {
    tenant: Vec<Regex>,
    landlord: Vec<Regex>,
    admin: Vec<Regex>,
}

impl RolePatterns {
    pub fn for_role(&self, role: Role) -> &[Regex] {
        match role {
            Role::Tenant => &self.tenant,
            Role::Landlord => &self.landlord,
            Role::Admin => &self.admin,
        }
    }
}

/// A gated path entry. `/admin` gates exactly `/admin`; `/admin/*` gates everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GatedPath {
    Exact(String),
    Subtree(String),
}

impl GatedPath {
    fn parse(raw: &str) -> Self {
        match raw.strip_suffix("/*") {
            Some(prefix) => GatedPath::Subtree(format!("{}/", prefix)),
            None => GatedPath::Exact(raw.to_string()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            GatedPath::Exact(exact) => path == exact,
            GatedPath::Subtree(prefix) => path.len() > prefix.len() && path.starts_with(prefix),
        }
    }
}

/// PolicyDocument
///
/// On-disk form of the route policy (`ROUTE_POLICY_FILE`). Every role key is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PolicyDocument {
    gated_paths: Vec<String>,
    auth_entry_paths: Vec<String>,
    #[serde(default = "default_home_path")]
    home_path: String,
    roles: RoleDocument,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoleDocument {
    tenant: Vec<String>,
    landlord: Vec<String>,
    admin: Vec<String>,
}

fn default_home_path() -> String {
    "/".to_string()
}

/// The policy shipped with the gateway. Admin pages live under `/admin`.
pub const BUILTIN_POLICY: &str = r#"{
    "gatedPaths": [
        "/login", "/register", "/create-listing",
        "/admin", "/admin/*",
        "/tenants", "/tenants/*",
        "/landlords", "/landlords/*"
    ],
    "authEntryPaths": ["/login", "/register"],
    "homePath": "/",
    "roles": {
        "tenant": ["^/tenants(/|$)"],
        "landlord": ["^/landlords(/|$)", "^/create-listing(/|$)"],
        "admin": ["^/admin(/|$)"]
    }
}"#;

/// AccessPolicy
///
/// The immutable route policy table plus the gated path set. Built once at startup
/// and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    gated: Vec<GatedPath>,
    auth_entry_paths: Vec<String>,
    roles: RolePatterns,
    login_path: String,
    home_path: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::from_json(BUILTIN_POLICY).expect("built-in route policy is valid")
    }
}

impl AccessPolicy {
    /// Parses a policy document, compiling every role pattern.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let doc: PolicyDocument = serde_json::from_str(raw)?;

        let compile = |patterns: Vec<String>| -> Result<Vec<Regex>, ConfigError> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|source| ConfigError::Pattern {
                        pattern: p.clone(),
                        source,
                    })
                })
                .collect()
        };

        Ok(Self {
            gated: doc.gated_paths.iter().map(|p| GatedPath::parse(p)).collect(),
            auth_entry_paths: doc.auth_entry_paths,
            roles: RolePatterns {
                tenant: compile(doc.roles.tenant)?,
                landlord: compile(doc.roles.landlord)?,
                admin: compile(doc.roles.admin)?,
            },
            login_path: "/login".to_string(),
            home_path: doc.home_path,
        })
    }

    /// Loads the policy from `path`, or the built-in policy when no file is configured.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_string(),
                    source,
                })?;
                Self::from_json(&raw)
            }
            None => Self::from_json(BUILTIN_POLICY),
        }
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn is_gated(&self, path: &str) -> bool {
        self.gated.iter().any(|g| g.matches(path))
    }

    pub fn is_auth_entry(&self, path: &str) -> bool {
        self.auth_entry_paths.iter().any(|p| p == path)
    }

    pub fn home_path(&self) -> &str {
        &self.home_path
    }

    /// Decides a gated navigation given the (possibly absent) resolved principal.
    ///
    /// Callers are expected to check `is_gated` first; ungated paths never reach here.
    pub fn decide(&self, path: &str, principal: Option<&Principal>) -> AccessDecision {
        let Some(principal) = principal else {
            if self.is_auth_entry(path) {
                return AccessDecision::Allow;
            }
            return AccessDecision::RedirectToLogin {
                redirect_path: path.to_string(),
            };
        };

        let permitted = principal
            .role
            .map(|role| self.roles.for_role(role))
            .unwrap_or_default()
            .iter()
            .any(|pattern| pattern.is_match(path));

        if permitted {
            AccessDecision::Allow
        } else {
            AccessDecision::RedirectToHome
        }
    }

    /// Redirect location for a decision, `None` for `Allow`.
    pub fn redirect_location(&self, decision: &AccessDecision) -> Option<String> {
        match decision {
            AccessDecision::Allow => None,
            AccessDecision::RedirectToLogin { redirect_path } => Some(format!(
                "{}?redirectPath={}",
                self.login_path,
                query_safe_path(redirect_path)
            )),
            AccessDecision::RedirectToHome => Some(self.home_path.clone()),
        }
    }
}

/// Percent-encodes each segment of `path` for use as a query value; `/` stays literal.
fn query_safe_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> Principal {
        Principal::new("t-1", "tenant")
    }

    #[test]
    fn gated_set_covers_exact_and_subtree_entries() {
        let policy = AccessPolicy::default();
        assert!(policy.is_gated("/admin"));
        assert!(policy.is_gated("/admin/users"));
        assert!(policy.is_gated("/tenants/requests/42"));
        assert!(policy.is_gated("/login"));
        assert!(!policy.is_gated("/"));
        assert!(!policy.is_gated("/listings"));
        assert!(!policy.is_gated("/administrator"));
        assert!(!policy.is_gated("/admin/"));
    }

    #[test]
    fn unknown_role_is_sent_home() {
        let policy = AccessPolicy::default();
        let stranger = Principal::new("x", "superuser");
        assert_eq!(stranger.role, None);
        assert_eq!(
            policy.decide("/admin/dashboard", Some(&stranger)),
            AccessDecision::RedirectToHome
        );
    }

    #[test]
    fn role_patterns_do_not_leak_across_prefixes() {
        let policy = AccessPolicy::default();
        assert_eq!(
            policy.decide("/tenantsville", Some(&tenant())),
            AccessDecision::RedirectToHome
        );
        assert_eq!(
            policy.decide("/tenants", Some(&tenant())),
            AccessDecision::Allow
        );
    }

    #[test]
    fn signed_in_user_visiting_login_goes_home() {
        let policy = AccessPolicy::default();
        assert_eq!(
            policy.decide("/login", Some(&tenant())),
            AccessDecision::RedirectToHome
        );
    }

    #[test]
    fn redirect_location_uses_configured_login_path() {
        let policy = AccessPolicy::default().with_login_path("/auth/sign-in");
        let decision = policy.decide("/landlords/dashboard", None);
        assert_eq!(
            policy.redirect_location(&decision).as_deref(),
            Some("/auth/sign-in?redirectPath=/landlords/dashboard")
        );
        assert_eq!(policy.redirect_location(&AccessDecision::Allow), None);
    }

    #[test]
    fn role_names_match_their_wire_form() {
        for role in [Role::Tenant, Role::Landlord, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
            assert_eq!(
                serde_json::to_value(role).unwrap(),
                serde_json::json!(role.as_str())
            );
        }
    }

    #[test]
    fn redirect_path_escapes_query_delimiters() {
        let policy = AccessPolicy::default();
        let decision = policy.decide("/tenants/a&b+c", None);
        assert_eq!(
            policy.redirect_location(&decision).as_deref(),
            Some("/login?redirectPath=/tenants/a%26b%2Bc")
        );

        let decision = policy.decide("/tenants/a%20b", None);
        assert_eq!(
            policy.redirect_location(&decision).as_deref(),
            Some("/login?redirectPath=/tenants/a%2520b")
        );
    }

    #[test]
    fn policy_document_requires_every_role() {
        let missing_admin = r#"{
            "gatedPaths": ["/admin"],
            "authEntryPaths": [],
            "roles": { "tenant": [], "landlord": [] }
        }"#;
        assert!(matches!(
            AccessPolicy::from_json(missing_admin),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let bad = r#"{
            "gatedPaths": [],
            "authEntryPaths": [],
            "roles": { "tenant": ["("], "landlord": [], "admin": [] }
        }"#;
        match AccessPolicy::from_json(bad) {
            Err(ConfigError::Pattern { pattern, .. }) => assert_eq!(pattern, "("),
            other => panic!("expected pattern error, got {:?}", other),
        }
    }

    #[test]
    fn empty_role_entry_denies_everything() {
        let doc = r#"{
            "gatedPaths": ["/landlords/*"],
            "authEntryPaths": ["/login"],
            "roles": { "tenant": [], "landlord": [], "admin": ["^/"] }
        }"#;
        let policy = AccessPolicy::from_json(doc).unwrap();
        let landlord = Principal::new("l-1", "landlord");
        assert_eq!(
            policy.decide("/landlords/listings", Some(&landlord)),
            AccessDecision::RedirectToHome
        );
        assert_eq!(policy.home_path(), "/");
    }
}
