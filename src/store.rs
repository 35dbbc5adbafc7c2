use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{StoredUser, UserUpdate};

/// Users kept as one JSON array in a single file.
///
/// Every operation runs under one async mutex and every write goes through a
/// sibling temporary file that is renamed over the data file, so readers in
/// this process never see a half-written array.
pub struct UserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UserStore {
    /// Opens the store at `path`, creating the file (and its parent
    /// directories) holding an empty array when it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let store = Self {
            path,
            lock: Mutex::new(()),
        };
        if !fs::try_exists(&store.path).await? {
            info!("Creating empty user file at {}", store.path.display());
            store.save(&[]).await?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> StoreResult<Vec<StoredUser>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    pub async fn get(&self, user_id: Uuid) -> StoreResult<Option<StoredUser>> {
        let _guard = self.lock.lock().await;
        let users = self.load().await?;
        Ok(users.into_iter().find(|u| u.user.user_id == user_id))
    }

    /// Appends `record`. Fails with `Conflict` when the id or the email is
    /// already taken.
    pub async fn insert(&self, record: StoredUser) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await?;

        if users.iter().any(|u| u.user.user_id == record.user.user_id) {
            return Err(StoreError::Conflict(format!(
                "user id {} already registered",
                record.user.user_id
            )));
        }
        if let Some(taken) = find_email(&users, &record.user.email, None) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                taken
            )));
        }

        users.push(record);
        self.save(&users).await
    }

    /// Applies `update` to the user with `user_id`. `None` when no such user.
    pub async fn update(
        &self,
        user_id: Uuid,
        update: UserUpdate,
    ) -> StoreResult<Option<StoredUser>> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await?;

        let Some(index) = users.iter().position(|u| u.user.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(email) = update.email.as_deref() {
            if let Some(taken) = find_email(&users, email, Some(user_id)) {
                return Err(StoreError::Conflict(format!(
                    "email {} already registered",
                    taken
                )));
            }
        }

        update.apply(&mut users[index].user);
        let updated = users[index].clone();
        self.save(&users).await?;
        Ok(Some(updated))
    }

    /// Removes the user with `user_id` and returns it.
    pub async fn delete(&self, user_id: Uuid) -> StoreResult<Option<StoredUser>> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await?;

        let Some(index) = users.iter().position(|u| u.user.user_id == user_id) else {
            return Ok(None);
        };
        let removed = users.remove(index);
        self.save(&users).await?;
        Ok(Some(removed))
    }

    async fn load(&self) -> StoreResult<Vec<StoredUser>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let users: Vec<StoredUser> = serde_json::from_slice(&bytes)?;
        debug!("Loaded {} users from {}", users.len(), self.path.display());
        Ok(users)
    }

    async fn save(&self, users: &[StoredUser]) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(users)?;
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} users to {}", users.len(), self.path.display());
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Email comparison ignores case. `except` skips the user being updated.
fn find_email<'a>(users: &'a [StoredUser], email: &str, except: Option<Uuid>) -> Option<&'a str> {
    users
        .iter()
        .filter(|u| Some(u.user.user_id) != except)
        .map(|u| u.user.email.as_str())
        .find(|taken| taken.eq_ignore_ascii_case(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use std::sync::Arc;

    fn record(email: &str) -> StoredUser {
        StoredUser {
            user: User {
                user_id: Uuid::new_v4(),
                email: email.to_string(),
                first_name: "Linus".to_string(),
                last_name: "Torvalds".to_string(),
                birth_date: None,
            },
            password_hash: "hash".to_string(),
        }
    }

    async fn open_temp() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open(dir.path().join("data").join("users.json"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_empty_array() {
        let (_dir, store) = open_temp().await;
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.trim(), "[]");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_keeps_existing_file() {
        let (dir, store) = open_temp().await;
        store.insert(record("a@example.com")).await.unwrap();
        drop(store);

        let reopened = UserStore::open(dir.path().join("data").join("users.json"))
            .await
            .unwrap();
        assert_eq!(reopened.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_file_reads_as_no_users() {
        let (_dir, store) = open_temp().await;
        std::fs::write(store.path(), "").unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_appends_one_record() {
        let (_dir, store) = open_temp().await;
        let first = record("a@example.com");
        let second = record("b@example.com");
        store.insert(first.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();

        let users = store.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user, first.user);
        assert_eq!(users[1].user, second.user);
        assert!(!tmp_path(store.path()).exists());
    }

    #[tokio::test]
    async fn insert_rejects_duplicates() {
        let (_dir, store) = open_temp().await;
        let first = record("a@example.com");
        store.insert(first.clone()).await.unwrap();

        let same_id = StoredUser {
            user: User {
                email: "other@example.com".to_string(),
                ..first.user.clone()
            },
            password_hash: "hash".to_string(),
        };
        assert!(matches!(
            store.insert(same_id).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.insert(record("A@Example.com")).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_update_delete() {
        let (_dir, store) = open_temp().await;
        let rec = record("a@example.com");
        let id = rec.user.user_id;
        store.insert(rec).await.unwrap();

        assert!(store.get(id).await.unwrap().is_some());
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());

        let update = UserUpdate {
            last_name: Some("Benedict".to_string()),
            ..Default::default()
        };
        let updated = store.update(id, update).await.unwrap().unwrap();
        assert_eq!(updated.user.last_name, "Benedict");
        assert_eq!(
            store.get(id).await.unwrap().unwrap().user.last_name,
            "Benedict"
        );

        let removed = store.delete(id).await.unwrap().unwrap();
        assert_eq!(removed.user.user_id, id);
        assert!(store.delete(id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_user() {
        let (_dir, store) = open_temp().await;
        let a = record("a@example.com");
        let b = record("b@example.com");
        let b_id = b.user.user_id;
        store.insert(a).await.unwrap();
        store.insert(b).await.unwrap();

        let steal = UserUpdate {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update(b_id, steal).await,
            Err(StoreError::Conflict(_))
        ));

        let keep = UserUpdate {
            email: Some("B@example.com".to_string()),
            ..Default::default()
        };
        let updated = store.update(b_id, keep).await.unwrap().unwrap();
        assert_eq!(updated.user.email, "B@example.com");
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_and_left_alone() {
        let (_dir, store) = open_temp().await;
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.list().await, Err(StoreError::Corrupt(_))));
        assert!(matches!(
            store.insert(record("a@example.com")).await,
            Err(StoreError::Corrupt(_))
        ));
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "{ not json"
        );
    }

    #[tokio::test]
    async fn concurrent_inserts_lose_nothing() {
        let (_dir, store) = open_temp().await;
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert(record(&format!("user{}@example.com", i)))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.list().await.unwrap().len(), 20);
    }
}
