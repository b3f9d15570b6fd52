/*
 * Responsibility
 * - Handler から見える「認証コンテキスト」の型
 * - middleware が token を検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - request ごとに新しく作られ、request と一緒に捨てられる (共有・キャッシュしない)
 */

use std::collections::BTreeSet;

/// Authentication state of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    Unauthenticated,
    Authenticated {
        subject: String,
        roles: BTreeSet<String>,
    },
}

impl AuthContext {
    pub fn authenticated<I, R>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self::Authenticated {
            subject: subject.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Authenticated { subject, .. } => Some(subject),
            Self::Unauthenticated => None,
        }
    }

    /// Granted roles; empty when unauthenticated.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        let roles = match self {
            Self::Authenticated { roles, .. } => Some(roles),
            Self::Unauthenticated => None,
        };
        roles.into_iter().flatten().map(String::as_str)
    }

    pub fn has_role(&self, role: &str) -> bool {
        match self {
            Self::Authenticated { roles, .. } => roles.contains(role),
            Self::Unauthenticated => false,
        }
    }

    pub fn has_any_role<'a>(&self, roles: impl IntoIterator<Item = &'a str>) -> bool {
        roles.into_iter().any(|role| self.has_role(role))
    }
}
