//! SQLite implementation of the taskhub [`Store`] trait.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use taskhub_storage::{
    Assignee, CreateListParams, CreateTodoParams, CreateUserParams, List, ListId, Member,
    Priority, Role, Store, StoreError, Todo, TodoId, TodoPage, TodoQuery, TodoStatus, User,
    UserId, Visibility,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// `~/.taskhub/store.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".taskhub");
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let path = dir.join("store.db");
        let url = format!("sqlite://{}?mode=rwc", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn backend_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Unique-constraint violations become `AlreadyExists`; anything else is a
/// backend failure.
fn insert_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists,
        _ => backend_err(e),
    }
}

fn fetch_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => backend_err(other),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::Backend(e.to_string()))
}

fn row_to_user(row: &SqliteRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId(parse_uuid(&row.try_get::<String, _>("id").map_err(backend_err)?)?),
        email: row.try_get("email").map_err(backend_err)?,
        handle: row.try_get("handle").map_err(backend_err)?,
        display_name: row.try_get("display_name").map_err(backend_err)?,
        created_at: row.try_get("created_at").map_err(backend_err)?,
        updated_at: row.try_get("updated_at").map_err(backend_err)?,
    })
}

fn row_to_list(row: &SqliteRow) -> Result<List, StoreError> {
    let visibility: String = row.try_get("visibility").map_err(backend_err)?;
    Ok(List {
        id: ListId(parse_uuid(&row.try_get::<String, _>("id").map_err(backend_err)?)?),
        name: row.try_get("name").map_err(backend_err)?,
        description: row.try_get("description").map_err(backend_err)?,
        visibility: Visibility::from_str(&visibility)
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        created_by: UserId(parse_uuid(
            &row.try_get::<String, _>("created_by").map_err(backend_err)?,
        )?),
        is_archived: row.try_get("is_archived").map_err(backend_err)?,
        color: row.try_get("color").map_err(backend_err)?,
        icon: row.try_get("icon").map_err(backend_err)?,
        created_at: row.try_get("created_at").map_err(backend_err)?,
        updated_at: row.try_get("updated_at").map_err(backend_err)?,
    })
}

fn row_to_member(row: &SqliteRow) -> Result<Member, StoreError> {
    let role: String = row.try_get("role").map_err(backend_err)?;
    let invited_by: Option<String> = row.try_get("invited_by").map_err(backend_err)?;
    Ok(Member {
        user_id: UserId(parse_uuid(
            &row.try_get::<String, _>("user_id").map_err(backend_err)?,
        )?),
        role: Role::from_str(&role).map_err(|e| StoreError::Backend(e.to_string()))?,
        joined_at: row.try_get("joined_at").map_err(backend_err)?,
        invited_by: invited_by.as_deref().map(parse_uuid).transpose()?.map(UserId),
    })
}

fn row_to_todo(row: &SqliteRow) -> Result<Todo, StoreError> {
    let status: String = row.try_get("status").map_err(backend_err)?;
    let priority: Option<String> = row.try_get("priority").map_err(backend_err)?;
    let tags_json: String = row.try_get("tags").map_err(backend_err)?;
    let tags: BTreeSet<String> =
        serde_json::from_str(&tags_json).map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(Todo {
        id: TodoId(parse_uuid(&row.try_get::<String, _>("id").map_err(backend_err)?)?),
        list_id: ListId(parse_uuid(
            &row.try_get::<String, _>("list_id").map_err(backend_err)?,
        )?),
        assignee: Assignee::Unresolved {
            id: UserId(parse_uuid(
                &row.try_get::<String, _>("assignee_id").map_err(backend_err)?,
            )?),
        },
        name: row.try_get("name").map_err(backend_err)?,
        description: row.try_get("description").map_err(backend_err)?,
        due_date: row.try_get("due_date").map_err(backend_err)?,
        status: TodoStatus::from_str(&status).map_err(|e| StoreError::Backend(e.to_string()))?,
        priority: priority
            .as_deref()
            .map(Priority::from_str)
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        tags,
        created_at: row.try_get("created_at").map_err(backend_err)?,
        updated_at: row.try_get("updated_at").map_err(backend_err)?,
    })
}

fn tags_to_json(tags: &BTreeSet<String>) -> Result<String, StoreError> {
    serde_json::to_string(tags).map_err(|e| StoreError::Backend(e.to_string()))
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Users ─────────────────────────────

    async fn create_user(&self, params: &CreateUserParams) -> Result<UserId, StoreError> {
        let id = UserId::new();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users(id,email,handle,display_name,created_at,updated_at)
             VALUES(?,?,?,?,?,?)",
        )
        .bind(id.0.to_string())
        .bind(&params.email)
        .bind(&params.handle)
        .bind(&params.display_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;
        Ok(id)
    }

    async fn get_user_by_id(&self, user_id: &UserId) -> Result<User, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.0.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_err)?;
        row_to_user(&row)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_err)?;
        row_to_user(&row)
    }

    async fn get_user_by_handle(&self, handle: &str) -> Result<User, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE handle = ?")
            .bind(handle)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_err)?;
        row_to_user(&row)
    }

    // ───────────────────────────── Lists ─────────────────────────────

    async fn create_list(&self, params: &CreateListParams) -> Result<List, StoreError> {
        let now = Utc::now();
        let mut txn = self.pool.begin().await.map_err(backend_err)?;

        sqlx::query(
            "INSERT INTO lists(id,name,description,visibility,created_by,is_archived,color,icon,created_at,updated_at)
             VALUES(?,?,?,?,?,0,?,?,?,?)",
        )
        .bind(params.id.0.to_string())
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.visibility.as_str())
        .bind(params.created_by.0.to_string())
        .bind(&params.color)
        .bind(&params.icon)
        .bind(now)
        .bind(now)
        .execute(&mut *txn)
        .await
        .map_err(insert_err)?;

        // The creator's Owner membership lands in the same transaction, so a
        // list can never be observed without an owner.
        sqlx::query(
            "INSERT INTO list_members(list_id,user_id,role,joined_at,invited_by)
             VALUES(?,?,?,?,NULL)",
        )
        .bind(params.id.0.to_string())
        .bind(params.created_by.0.to_string())
        .bind(Role::Owner.as_str())
        .bind(now)
        .execute(&mut *txn)
        .await
        .map_err(insert_err)?;

        txn.commit().await.map_err(backend_err)?;

        Ok(List {
            id: params.id,
            name: params.name.clone(),
            description: params.description.clone(),
            visibility: params.visibility,
            created_by: params.created_by,
            is_archived: false,
            color: params.color.clone(),
            icon: params.icon.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_list(&self, list_id: &ListId) -> Result<List, StoreError> {
        let row = sqlx::query("SELECT * FROM lists WHERE id = ?")
            .bind(list_id.0.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_err)?;
        row_to_list(&row)
    }

    async fn list_lists_for_user(&self, user_id: &UserId) -> Result<Vec<List>, StoreError> {
        let rows = sqlx::query(
            "SELECT l.* FROM lists l
             JOIN list_members m ON m.list_id = l.id
             WHERE m.user_id = ?
             ORDER BY l.created_at, l.id",
        )
        .bind(user_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;
        rows.iter().map(row_to_list).collect()
    }

    async fn update_list_meta(&self, list: &List) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE lists SET name=?, description=?, visibility=?, color=?, icon=?, updated_at=?
             WHERE id = ?",
        )
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.visibility.as_str())
        .bind(&list.color)
        .bind(&list.icon)
        .bind(Utc::now())
        .bind(list.id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_archived(&self, list_id: &ListId, archived: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE lists SET is_archived=?, updated_at=? WHERE id = ?")
            .bind(archived)
            .bind(Utc::now())
            .bind(list_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_list(&self, list_id: &ListId) -> Result<(), StoreError> {
        let mut txn = self.pool.begin().await.map_err(backend_err)?;
        let id = list_id.0.to_string();

        sqlx::query("DELETE FROM todos WHERE list_id = ?")
            .bind(&id)
            .execute(&mut *txn)
            .await
            .map_err(backend_err)?;
        sqlx::query("DELETE FROM list_members WHERE list_id = ?")
            .bind(&id)
            .execute(&mut *txn)
            .await
            .map_err(backend_err)?;
        let result = sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind(&id)
            .execute(&mut *txn)
            .await
            .map_err(backend_err)?;

        if result.rows_affected() == 0 {
            // Rolls back the dependent deletes on drop.
            return Err(StoreError::NotFound);
        }
        txn.commit().await.map_err(backend_err)?;
        Ok(())
    }

    // ───────────────────────────── Members ─────────────────────────────

    async fn get_member(&self, list_id: &ListId, user_id: &UserId) -> Result<Member, StoreError> {
        let row = sqlx::query("SELECT * FROM list_members WHERE list_id = ? AND user_id = ?")
            .bind(list_id.0.to_string())
            .bind(user_id.0.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_err)?;
        row_to_member(&row)
    }

    async fn list_members(&self, list_id: &ListId) -> Result<Vec<Member>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM list_members WHERE list_id = ? ORDER BY joined_at, user_id",
        )
        .bind(list_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;
        rows.iter().map(row_to_member).collect()
    }

    async fn add_member(&self, list_id: &ListId, member: &Member) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO list_members(list_id,user_id,role,joined_at,invited_by)
             VALUES(?,?,?,?,?)",
        )
        .bind(list_id.0.to_string())
        .bind(member.user_id.0.to_string())
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .bind(member.invited_by.map(|u| u.0.to_string()))
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;
        Ok(())
    }

    async fn update_member_role(
        &self,
        list_id: &ListId,
        user_id: &UserId,
        role: Role,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE list_members SET role=? WHERE list_id = ? AND user_id = ?")
                .bind(role.as_str())
                .bind(list_id.0.to_string())
                .bind(user_id.0.to_string())
                .execute(&self.pool)
                .await
                .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn remove_member(&self, list_id: &ListId, user_id: &UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM list_members WHERE list_id = ? AND user_id = ?")
            .bind(list_id.0.to_string())
            .bind(user_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Todos ─────────────────────────────

    async fn create_todo(&self, params: &CreateTodoParams) -> Result<Todo, StoreError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO todos(id,list_id,assignee_id,name,description,due_date,status,priority,tags,created_at,updated_at)
             VALUES(?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(params.id.0.to_string())
        .bind(params.list_id.0.to_string())
        .bind(params.assignee_id.0.to_string())
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.due_date)
        .bind(params.status.as_str())
        .bind(params.priority.map(|p| p.as_str()))
        .bind(tags_to_json(&params.tags)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(insert_err)?;

        Ok(Todo {
            id: params.id,
            list_id: params.list_id,
            assignee: Assignee::Unresolved {
                id: params.assignee_id,
            },
            name: params.name.clone(),
            description: params.description.clone(),
            due_date: params.due_date,
            status: params.status,
            priority: params.priority,
            tags: params.tags.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_todo(&self, todo_id: &TodoId) -> Result<Todo, StoreError> {
        let row = sqlx::query("SELECT * FROM todos WHERE id = ?")
            .bind(todo_id.0.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_err)?;
        row_to_todo(&row)
    }

    async fn update_todo(&self, todo: &Todo) -> Result<(), StoreError> {
        // list_id deliberately absent from the SET clause: todos cannot move
        // between lists.
        let result = sqlx::query(
            "UPDATE todos SET assignee_id=?, name=?, description=?, due_date=?, status=?, priority=?, tags=?, updated_at=?
             WHERE id = ?",
        )
        .bind(todo.assignee.user_id().0.to_string())
        .bind(&todo.name)
        .bind(&todo.description)
        .bind(todo.due_date)
        .bind(todo.status.as_str())
        .bind(todo.priority.map(|p| p.as_str()))
        .bind(tags_to_json(&todo.tags)?)
        .bind(Utc::now())
        .bind(todo.id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_todo(&self, todo_id: &TodoId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(todo_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn query_todos(
        &self,
        list_ids: &[ListId],
        query: &TodoQuery,
    ) -> Result<TodoPage, StoreError> {
        if list_ids.is_empty() {
            return Ok(TodoPage {
                items: Vec::new(),
                total: 0,
                page: query.page,
                total_pages: 0,
            });
        }

        let placeholders = vec!["?"; list_ids.len()].join(",");
        let sql = format!("SELECT * FROM todos WHERE list_id IN ({})", placeholders);
        let mut q = sqlx::query(&sql);
        for id in list_ids {
            q = q.bind(id.0.to_string());
        }
        let rows = q.fetch_all(&self.pool).await.map_err(backend_err)?;
        let todos: Vec<Todo> = rows.iter().map(row_to_todo).collect::<Result<_, _>>()?;

        // Tag-set matching doesn't map onto SQL without a join table, so all
        // backends funnel candidates through the shared pure query helpers.
        // That also guarantees identical sort/pagination semantics everywhere.
        Ok(taskhub_storage::query::run_query(todos, query))
    }
}
