use crate::schema::{DependencyResolver, TableSchema, SURROGATE_KEY};

/// Denormalized structure listing consumed by the viewer
const VIEW_DATA_STRUCTURES: &str = r#"CREATE VIEW "ViewDataStructures" AS
SELECT
    ds."Id" AS "Id",
    ds."EngName" AS "EngName",
    COALESCE(p."Name", e."Name") AS "Source",
    (
        SELECT group_concat(ce."Name" || '/' || cm."Name" || '/' || c."Id", ', ')
        FROM "Channels" c
        JOIN "Equipments" ce ON ce."Id" = c."Equipment"
        JOIN "Modules" cm ON cm."Id" = c."Module"
        WHERE c."DataStructure" = ds."Id"
    ) AS "Channel"
FROM "DataStructures" ds
LEFT JOIN "PartitionList" p ON p."Id" = ds."SourcePartition"
LEFT JOIN "Equipments" e ON e."Id" = ds."SourceEquipment""#;

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

fn quote_all(identifiers: &[&str]) -> String {
    identifiers
        .iter()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", quote(schema.name));
    let mut columns = Vec::new();

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let pk = if schema.primary_key.is_empty() && col.name == SURROGATE_KEY {
            " PRIMARY KEY"
        } else {
            ""
        };

        columns.push(format!(
            "    {} {}{}{}",
            quote(col.name),
            col.col_type.sql(),
            pk,
            null_constraint
        ));
    }

    if !schema.primary_key.is_empty() {
        columns.push(format!("    PRIMARY KEY ({})", quote_all(schema.primary_key)));
    }

    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            quote(fk.column),
            quote(fk.references_table),
            quote(fk.references_column)
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for natural keys, explicit indexes and
/// foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let explicit = schema.indexes.iter().map(|index| {
        let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
        format!(
            "CREATE {} {} ON {}({})",
            kind,
            quote(&format!("idx_{}_{}", schema.name, index.columns.join("_"))),
            quote(schema.name),
            quote_all(index.columns)
        )
    });

    // Leading primary-key columns are already indexed
    let leading_pk = schema.primary_key.first().copied();
    let foreign = schema
        .foreign_keys
        .iter()
        .filter(move |fk| Some(fk.column) != leading_pk)
        .map(|fk| {
            format!(
                "CREATE INDEX {} ON {}({})",
                quote(&format!("idx_{}_{}", schema.name, fk.column)),
                quote(schema.name),
                quote(fk.column)
            )
        });

    explicit.chain(foreign).collect()
}

/// Full DDL script for the built-in schema: tables in dependency order,
/// their indexes, then views
pub fn ddl_script() -> Result<String, String> {
    let tables = DependencyResolver::new().creation_order()?;
    let mut statements = Vec::new();

    for table in tables {
        statements.push(generate_create_table(table));
        statements.extend(generate_indexes(table));
    }
    statements.push(VIEW_DATA_STRUCTURES.to_string());

    Ok(statements.join(";\n\n") + ";\n")
}
