//! Table schema definitions for the GILDA configuration store

use super::types::*;

// =============================================================================
// Reference Tables (seeded at creation, read-only for ingestion)
// =============================================================================

pub static PARTITION_LIST: TableSchema = TableSchema {
    name: "PartitionList",
    columns: &[
        Column::id(),
        Column::required("Name", ColumnType::Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[Index::unique(&["Name"])],
    reference: true,
};

pub static EQUIPMENTS: TableSchema = TableSchema {
    name: "Equipments",
    columns: &[
        Column::id(),
        Column::required("Name", ColumnType::Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[Index::unique(&["Name"])],
    reference: true,
};

pub static MODULES: TableSchema = TableSchema {
    name: "Modules",
    columns: &[
        Column::id(),
        Column::required("Name", ColumnType::Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[Index::unique(&["Name"])],
    reference: true,
};

pub static CHANNEL_DIRECTION: TableSchema = TableSchema {
    name: "ChannelDirection",
    columns: &[
        Column::id(),
        Column::required("Direction", ColumnType::Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[Index::unique(&["Direction"])],
    reference: true,
};

// =============================================================================
// Interned Lookup Tables
// =============================================================================

pub static PARAMETER_TYPES: TableSchema = TableSchema {
    name: "ParameterTypes",
    columns: &[
        Column::id(),
        Column::required("Type", ColumnType::Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[Index::unique(&["Type"])],
    reference: false,
};

pub static PARAMETER_UNITS: TableSchema = TableSchema {
    name: "ParameterUnits",
    columns: &[
        Column::id(),
        Column::required("Unit", ColumnType::Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[Index::unique(&["Unit"])],
    reference: false,
};

pub static PARAMETER_ENUM_DEFINITIONS: TableSchema = TableSchema {
    name: "ParameterEnumDefinitions",
    columns: &[
        Column::id(),
        Column::required("Definition", ColumnType::Text),
        Column::new("Comment", ColumnType::Text),
    ],
    primary_key: &[],
    foreign_keys: &[],
    indexes: &[Index::unique(&["Definition"])],
    reference: false,
};

// =============================================================================
// Structures, Fields and Channels
// =============================================================================

pub static DATA_STRUCTURES: TableSchema = TableSchema {
    name: "DataStructures",
    columns: &[
        Column::id(),
        Column::required("EngName", ColumnType::Text),
        Column::new("SourcePartition", ColumnType::Integer),
        Column::new("SourceEquipment", ColumnType::Integer),
        // Numeric channel id, not a row reference: channel keys are composite
        Column::new("Channel", ColumnType::Integer),
        Column::new("MonitorPoint", ColumnType::Integer),
    ],
    primary_key: &[],
    foreign_keys: &[
        ForeignKey::new("SourcePartition", "PartitionList"),
        ForeignKey::new("SourceEquipment", "Equipments"),
    ],
    indexes: &[Index::unique(&["EngName"])],
    reference: false,
};

pub static PARAMETER_FIELDS: TableSchema = TableSchema {
    name: "ParameterFields",
    columns: &[
        Column::id(),
        Column::required("Name", ColumnType::Text),
        Column::new("RefEngName", ColumnType::Text),
        Column::required("Size", ColumnType::Integer),
        Column::required("Offset", ColumnType::Integer),
        Column::new("Type", ColumnType::Integer),
        Column::new("SourcePartition", ColumnType::Integer),
        Column::new("DataStructure", ColumnType::Integer),
        Column::new("Unit", ColumnType::Integer),
        Column::new("Description", ColumnType::Text),
        Column::new("Min", ColumnType::Real),
        Column::new("Max", ColumnType::Real),
        Column::new("LowBit", ColumnType::Integer),
        Column::new("HighBit", ColumnType::Integer),
    ],
    primary_key: &[],
    foreign_keys: &[
        ForeignKey::new("Type", "ParameterTypes"),
        ForeignKey::new("SourcePartition", "PartitionList"),
        ForeignKey::new("DataStructure", "DataStructures"),
        ForeignKey::new("Unit", "ParameterUnits"),
    ],
    indexes: &[Index::unique(&["Name"])],
    reference: false,
};

pub static PARAMETER_ENUM_VALUES: TableSchema = TableSchema {
    name: "ParameterEnumValues",
    columns: &[
        Column::required("ParameterField", ColumnType::Integer),
        Column::required("Value", ColumnType::Integer),
        Column::required("Definition", ColumnType::Integer),
    ],
    primary_key: &["ParameterField", "Value"],
    foreign_keys: &[
        ForeignKey::new("ParameterField", "ParameterFields"),
        ForeignKey::new("Definition", "ParameterEnumDefinitions"),
    ],
    indexes: &[],
    reference: false,
};

pub static CHANNELS: TableSchema = TableSchema {
    name: "Channels",
    columns: &[
        Column::required("Id", ColumnType::Integer),
        Column::required("Equipment", ColumnType::Integer),
        Column::required("Module", ColumnType::Integer),
        Column::required("Direction", ColumnType::Integer),
        Column::new("DataStructure", ColumnType::Integer),
        Column::new("Description", ColumnType::Text),
    ],
    primary_key: &["Id", "Equipment", "Module"],
    foreign_keys: &[
        ForeignKey::new("Equipment", "Equipments"),
        ForeignKey::new("Module", "Modules"),
        ForeignKey::new("Direction", "ChannelDirection"),
        ForeignKey::new("DataStructure", "DataStructures"),
    ],
    indexes: &[Index::on(&["Description"])],
    reference: false,
};

// =============================================================================
// ARINC-429
// =============================================================================

pub static ARINC_PARAMETERS: TableSchema = TableSchema {
    name: "ArincParameters",
    columns: &[
        Column::id(),
        Column::required("ParameterFieldsId", ColumnType::Integer),
        Column::required("Label", ColumnType::Integer),
        Column::required("Name", ColumnType::Text),
        Column::new("Description", ColumnType::Text),
        Column::new("Type", ColumnType::Integer),
        Column::required("Offset", ColumnType::Integer),
        Column::required("Length", ColumnType::Integer),
        Column::new("Unit", ColumnType::Integer),
        Column::new("Min", ColumnType::Real),
        Column::new("Max", ColumnType::Real),
        Column::new("ScaleFactor", ColumnType::Real),
    ],
    primary_key: &[],
    foreign_keys: &[
        ForeignKey::new("ParameterFieldsId", "ParameterFields"),
        ForeignKey::new("Type", "ParameterTypes"),
        ForeignKey::new("Unit", "ParameterUnits"),
    ],
    indexes: &[Index::unique(&["Label", "Name", "ParameterFieldsId"])],
    reference: false,
};

pub static ARINC_DISCRETES: TableSchema = TableSchema {
    name: "ArincDiscretes",
    columns: &[
        Column::id(),
        Column::required("Value", ColumnType::Integer),
        Column::required("Name", ColumnType::Text),
        Column::required("Label", ColumnType::Integer),
        Column::required("Offset", ColumnType::Integer),
        Column::required("ParameterFieldsId", ColumnType::Integer),
    ],
    primary_key: &[],
    foreign_keys: &[ForeignKey::new("ParameterFieldsId", "ParameterFields")],
    indexes: &[Index::unique(&["ParameterFieldsId", "Label", "Offset", "Value"])],
    reference: false,
};

/// All tables, in no particular order; see `DependencyResolver` for creation order
pub static ALL_TABLES: &[&TableSchema] = &[
    &ARINC_DISCRETES,
    &ARINC_PARAMETERS,
    &CHANNELS,
    &PARAMETER_ENUM_VALUES,
    &PARAMETER_FIELDS,
    &DATA_STRUCTURES,
    &PARAMETER_ENUM_DEFINITIONS,
    &PARAMETER_UNITS,
    &PARAMETER_TYPES,
    &CHANNEL_DIRECTION,
    &MODULES,
    &EQUIPMENTS,
    &PARTITION_LIST,
];

/// Get a table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys_point_at_known_tables() {
        for table in ALL_TABLES {
            for fk in table.foreign_keys {
                assert!(
                    get_table(fk.references_table).is_some(),
                    "{}.{} references unknown table {}",
                    table.name,
                    fk.column,
                    fk.references_table
                );
                assert!(table.columns.iter().any(|c| c.name == fk.column));
            }
        }
    }

    #[test]
    fn test_every_ingested_table_has_natural_key() {
        for table in ALL_TABLES {
            assert!(
                table.natural_key().is_some(),
                "{} has no natural key",
                table.name
            );
        }
        assert_eq!(
            CHANNELS.natural_key(),
            Some(&["Id", "Equipment", "Module"][..])
        );
    }
}
