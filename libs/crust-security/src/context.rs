use secrecy::SecretString;
use uuid::Uuid;

/// `SecurityContext` holds the authenticated identity of the current request.
///
/// Built by a credential verifier (stateless mode) or restored from the session
/// store (session mode), then inserted into the request extensions by the
/// authorization middleware.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    /// Subject ID. Nil for anonymous requests.
    subject_id: Uuid,
    /// Login name the subject authenticated with, if any.
    principal: Option<String>,
    /// Granted authorities (roles or permissions) as opaque strings.
    #[serde(default)]
    authorities: Vec<String>,
    /// Bearer token the request was authenticated with. Never serialized.
    #[serde(skip)]
    bearer_token: Option<SecretString>,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Create an anonymous `SecurityContext` with no subject or authorities
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    /// Whether this context carries no authenticated subject.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.subject_id.is_nil()
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    #[must_use]
    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    #[must_use]
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    /// Get the bearer token the request was authenticated with.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<Uuid>,
    principal: Option<String>,
    authorities: Vec<String>,
    bearer_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn principal(mut self, principal: &str) -> Self {
        self.principal = Some(principal.to_owned());
        self
    }

    #[must_use]
    pub fn authorities(mut self, authorities: Vec<String>) -> Self {
        self.authorities = authorities;
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id.unwrap_or_default(),
            principal: self.principal,
            authorities: self.authorities,
            bearer_token: self.bearer_token,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_security_context_builder_full() {
        let subject_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();

        let ctx = SecurityContext::builder()
            .subject_id(subject_id)
            .principal("alice")
            .authorities(vec!["ROLE_USER".to_owned(), "ROLE_ADMIN".to_owned()])
            .bearer_token("test-token-123".to_owned())
            .build();

        assert_eq!(ctx.subject_id(), subject_id);
        assert_eq!(ctx.principal(), Some("alice"));
        assert_eq!(ctx.authorities(), &["ROLE_USER", "ROLE_ADMIN"]);
        assert!(ctx.has_authority("ROLE_ADMIN"));
        assert!(!ctx.has_authority("ROLE_ROOT"));
        assert!(!ctx.is_anonymous());
        assert_eq!(
            ctx.bearer_token().map(ExposeSecret::expose_secret),
            Some("test-token-123"),
        );
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = SecurityContext::anonymous();

        assert!(ctx.is_anonymous());
        assert_eq!(ctx.subject_id(), Uuid::nil());
        assert!(ctx.principal().is_none());
        assert!(ctx.authorities().is_empty());
        assert!(ctx.bearer_token().is_none());
    }

    #[test]
    fn test_serialization_skips_bearer_token() {
        let ctx = SecurityContext::builder()
            .subject_id(Uuid::new_v4())
            .principal("bob")
            .bearer_token("secret".to_owned())
            .build();

        let json = serde_json::to_value(&ctx).unwrap();
        assert!(json.get("bearer_token").is_none());
        assert_eq!(json["principal"], "bob");

        let restored: SecurityContext = serde_json::from_value(json).unwrap();
        assert_eq!(restored.subject_id(), ctx.subject_id());
        assert!(restored.bearer_token().is_none());
    }
}
