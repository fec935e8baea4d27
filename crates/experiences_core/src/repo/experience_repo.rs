//! Experience repository contract, SQLite and in-memory implementations.

use crate::db::DbError;
use crate::model::coordinate::Coordinate;
use crate::model::experience::{Experience, ExperienceId, ExperienceParts};
use crate::model::media::{MediaKind, MediaParts, MediaRecord};
use crate::model::ModelValidationError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const EXPERIENCE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    subtitle,
    latitude,
    longitude,
    created_at,
    updated_at
FROM experiences";

const MEDIA_SELECT_SQL: &str = "SELECT
    uuid,
    experience_uuid,
    kind,
    reference,
    payload,
    created_at,
    updated_at
FROM media";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for experience snapshots.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted experience data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for registry snapshots.
pub trait ExperienceRepository {
    /// Replaces the stored snapshot with `experiences`, in the given order.
    fn save_all(&self, experiences: &[&Experience]) -> RepoResult<()>;
    /// Loads the stored snapshot in saved order.
    fn load_all(&self) -> RepoResult<Vec<Experience>>;
    fn get_experience(&self, id: ExperienceId) -> RepoResult<Option<Experience>>;
}

/// SQLite-backed repository over a migrated connection.
pub struct SqliteExperienceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExperienceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Loads media grouped by owning experience, each group in saved order.
    fn load_media(
        &self,
        experience_id: Option<ExperienceId>,
    ) -> RepoResult<HashMap<ExperienceId, Vec<MediaRecord>>> {
        let mut grouped: HashMap<ExperienceId, Vec<MediaRecord>> = HashMap::new();
        let mut stmt = match experience_id {
            Some(_) => self.conn.prepare(&format!(
                "{MEDIA_SELECT_SQL} WHERE experience_uuid = ?1 ORDER BY position ASC;"
            ))?,
            None => self.conn.prepare(&format!(
                "{MEDIA_SELECT_SQL} ORDER BY experience_uuid ASC, position ASC;"
            ))?,
        };
        let mut rows = match experience_id {
            Some(id) => stmt.query([id.to_string()])?,
            None => stmt.query([])?,
        };

        while let Some(row) = rows.next()? {
            let owner = parse_uuid(row, "experience_uuid")?;
            grouped.entry(owner).or_default().push(parse_media_row(row)?);
        }
        Ok(grouped)
    }
}

impl ExperienceRepository for SqliteExperienceRepository<'_> {
    fn save_all(&self, experiences: &[&Experience]) -> RepoResult<()> {
        for experience in experiences {
            experience.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM media;", [])?;
        tx.execute("DELETE FROM experiences;", [])?;

        for (position, experience) in experiences.iter().enumerate() {
            let coordinate = experience.coordinate();
            tx.execute(
                "INSERT INTO experiences (
                    uuid,
                    position,
                    title,
                    subtitle,
                    latitude,
                    longitude,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    experience.id().to_string(),
                    position as i64,
                    experience.title(),
                    experience.subtitle(),
                    coordinate.latitude(),
                    coordinate.longitude(),
                    experience.created_at_ms(),
                    experience.updated_at_ms(),
                ],
            )?;

            for (media_position, record) in experience.media_list().iter().enumerate() {
                tx.execute(
                    "INSERT INTO media (
                        uuid,
                        experience_uuid,
                        position,
                        kind,
                        reference,
                        payload,
                        created_at,
                        updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                    params![
                        record.id().to_string(),
                        experience.id().to_string(),
                        media_position as i64,
                        record.kind().as_db_str(),
                        record.reference(),
                        record.payload(),
                        record.created_at_ms(),
                        record.updated_at_ms(),
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_all(&self) -> RepoResult<Vec<Experience>> {
        let mut media = self.load_media(None)?;
        let mut stmt = self
            .conn
            .prepare(&format!("{EXPERIENCE_SELECT_SQL} ORDER BY position ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut experiences = Vec::new();

        while let Some(row) = rows.next()? {
            let id = parse_uuid(row, "uuid")?;
            let owned = media.remove(&id).unwrap_or_default();
            experiences.push(parse_experience_row(row, id, owned)?);
        }

        if let Some(orphan) = media.keys().next() {
            return Err(RepoError::InvalidData(format!(
                "media rows reference unknown experience `{orphan}`"
            )));
        }
        Ok(experiences)
    }

    fn get_experience(&self, id: ExperienceId) -> RepoResult<Option<Experience>> {
        let mut media = self.load_media(Some(id))?;
        self.conn
            .query_row(
                &format!("{EXPERIENCE_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| {
                    let owned = media.remove(&id).unwrap_or_default();
                    Ok(parse_experience_row(row, id, owned))
                },
            )
            .optional()?
            .transpose()
    }
}

/// Repository holding the snapshot in process memory.
///
/// Useful for ephemeral sessions and tests that do not need SQLite.
#[derive(Debug, Default)]
pub struct InMemoryExperienceRepository {
    snapshot: RefCell<Vec<Experience>>,
}

impl InMemoryExperienceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExperienceRepository for InMemoryExperienceRepository {
    fn save_all(&self, experiences: &[&Experience]) -> RepoResult<()> {
        for experience in experiences {
            experience.validate()?;
        }
        *self.snapshot.borrow_mut() = experiences
            .iter()
            .map(|experience| (*experience).clone())
            .collect();
        Ok(())
    }

    fn load_all(&self) -> RepoResult<Vec<Experience>> {
        Ok(self.snapshot.borrow().clone())
    }

    fn get_experience(&self, id: ExperienceId) -> RepoResult<Option<Experience>> {
        Ok(self
            .snapshot
            .borrow()
            .iter()
            .find(|experience| experience.id() == id)
            .cloned())
    }
}

fn parse_experience_row(
    row: &Row<'_>,
    id: ExperienceId,
    media: Vec<MediaRecord>,
) -> RepoResult<Experience> {
    let coordinate = Coordinate::new(row.get("latitude")?, row.get("longitude")?)?;
    let experience = Experience::from_parts(ExperienceParts {
        id,
        title: row.get("title")?,
        subtitle: row.get("subtitle")?,
        coordinate,
        media,
        created_at_ms: row.get("created_at")?,
        updated_at_ms: row.get("updated_at")?,
    })?;
    Ok(experience)
}

fn parse_media_row(row: &Row<'_>) -> RepoResult<MediaRecord> {
    let kind_text: String = row.get("kind")?;
    let kind = MediaKind::from_label(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid media kind `{kind_text}` in media.kind"))
    })?;

    let record = MediaRecord::from_parts(MediaParts {
        id: parse_uuid(row, "uuid")?,
        kind,
        reference: row.get("reference")?,
        payload: row.get("payload")?,
        created_at_ms: row.get("created_at")?,
        updated_at_ms: row.get("updated_at")?,
    })?;
    Ok(record)
}

fn parse_uuid(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}
