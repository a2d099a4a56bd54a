use std::sync::LazyLock;
use tabula_core::{Entity, Mapping, Result, Row, SqlitePool, Table};

#[derive(Debug, Default)]
struct Todo {
    id: i64,
    title: String,
}

static TODO: LazyLock<Mapping<Todo>> = LazyLock::new(|| {
    Mapping::new()
        .field("id", |t: &mut Todo, v| t.id = v)
        .field("title", |t: &mut Todo, v| t.title = v)
});

impl Entity for Todo {
    fn from_row(row: &Row) -> Result<Self> {
        TODO.decode(row)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let db = SqlitePool::connect("sqlite::memory:").await?;

    let todos: Table<Todo> = Table::new("todos", ("id", "title"))?
        .with_schema("id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL");
    todos.create_if_not_exists(&db).await?;

    // Insert
    let title = "assist Borat";
    let id = todos.insert().columns("title").values(title).run(&db).await?;
    println!("Inserted todo: id={id}, title={title}");

    // Query all
    println!("Query all: {:?}", todos.get_all(&db).await?);

    // Query by ID
    println!("Query by ID: {:?}", todos.get_by_id(&db, id).await?);

    // Update
    let title = "no longer friends with borat";
    todos
        .update()
        .set("title", title)
        .where_("id = ?", id)
        .run(&db)
        .await?;
    println!("Updated todo: id={id}, title={title}");
    println!("Query by ID: {:?}", todos.get_by_id(&db, id).await?);

    // Delete
    todos.delete().where_("id = ?", id).run(&db).await?;
    println!("Deleted todo: id={id}");

    match todos.get_by_id(&db, id).await {
        Err(e) if e.is_not_found() => println!("Query by ID: {e}"),
        other => println!("Query by ID: unexpected {other:?}"),
    }

    Ok(())
}
