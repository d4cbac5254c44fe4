use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use warden_login::{Account, CredentialStore, Criteria, StoreError};

#[derive(Debug, Clone)]
struct Entry<A> {
    account: A,
    password: String,
}

/// In-memory credential store.
///
/// Intended for tests/dev: passwords are kept and compared as given, with no
/// hashing. Accounts are keyed by email.
#[derive(Debug)]
pub struct InMemoryCredentialStore<A> {
    model: String,
    by_email: RwLock<HashMap<String, Entry<A>>>,
    bypass_email: RwLock<Option<String>>,
}

impl<A: Account> InMemoryCredentialStore<A> {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            by_email: RwLock::new(HashMap::new()),
            bypass_email: RwLock::new(None),
        }
    }

    pub fn insert(&self, email: impl Into<String>, password: impl Into<String>, account: A) -> Result<(), StoreError> {
        let mut by_email = self.by_email.write().map_err(|_| StoreError::LockPoisoned)?;
        by_email.insert(
            email.into().to_ascii_lowercase(),
            Entry {
                account,
                password: password.into(),
            },
        );
        Ok(())
    }

    /// Account returned for bypass lookups.
    pub fn set_bypass_account(&self, email: impl Into<String>) -> Result<(), StoreError> {
        let mut bypass = self.bypass_email.write().map_err(|_| StoreError::LockPoisoned)?;
        *bypass = Some(email.into().to_ascii_lowercase());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_email.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find<F>(&self, pred: F) -> Result<Option<A>, StoreError>
    where
        F: Fn(&str, &Entry<A>) -> bool,
    {
        let by_email = self.by_email.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(by_email
            .iter()
            .find(|(email, entry)| pred(email, entry))
            .map(|(_, entry)| entry.account.clone()))
    }
}

#[async_trait]
impl<A: Account> CredentialStore for InMemoryCredentialStore<A> {
    type Account = A;

    fn model(&self) -> &str {
        &self.model
    }

    async fn authenticate(&self, criteria: &Criteria) -> Result<Option<A>, StoreError> {
        match criteria {
            Criteria::Password { email, password } => {
                let email = email.to_ascii_lowercase();
                self.find(|candidate, entry| candidate == email && &entry.password == password)
            }
            Criteria::SessionToken(token) => {
                self.find(|_, entry| &entry.account.identity_ref() == token)
            }
            Criteria::Bypass => {
                let bypass = self
                    .bypass_email
                    .read()
                    .map_err(|_| StoreError::LockPoisoned)?
                    .clone();
                match bypass {
                    Some(email) => self.find(|candidate, _| candidate == email),
                    None => Ok(None),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_auth::{Role, Subject};
    use warden_core::IdentityRef;

    #[derive(Debug, Clone)]
    struct Member {
        id: IdentityRef,
        roles: Vec<Role>,
    }

    impl Subject for Member {
        fn identity(&self) -> Option<&IdentityRef> {
            Some(&self.id)
        }

        fn roles(&self) -> &[Role] {
            &self.roles
        }
    }

    impl Account for Member {
        fn identity_ref(&self) -> IdentityRef {
            self.id.clone()
        }
    }

    fn store() -> InMemoryCredentialStore<Member> {
        let store = InMemoryCredentialStore::new("member");
        store
            .insert(
                "Ada@Example.com",
                "secret",
                Member {
                    id: IdentityRef::new("1"),
                    roles: vec![Role::new("admin")],
                },
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn password_lookup_is_case_insensitive_on_email_only() {
        let store = store();

        let found = store
            .authenticate(&Criteria::Password {
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, IdentityRef::new("1"));

        let wrong = store
            .authenticate(&Criteria::Password {
                email: "ada@example.com".to_string(),
                password: "SECRET".to_string(),
            })
            .await
            .unwrap();
        assert!(wrong.is_none());
    }

    #[tokio::test]
    async fn session_token_resolves_by_identity() {
        let store = store();
        let found = store
            .authenticate(&Criteria::SessionToken(IdentityRef::new("1")))
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = store
            .authenticate(&Criteria::SessionToken(IdentityRef::new("2")))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn bypass_requires_a_designated_account() {
        let store = store();
        assert!(store.authenticate(&Criteria::Bypass).await.unwrap().is_none());

        store.set_bypass_account("ada@example.com").unwrap();
        assert!(store.authenticate(&Criteria::Bypass).await.unwrap().is_some());
        assert_eq!(store.model(), "member");
        assert_eq!(store.len(), 1);
    }
}
