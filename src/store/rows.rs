//! Row payloads handed to the store's upsert operations.
//!
//! Ids are already resolved; the ingestors own the mapping from source text
//! to these values.

/// DataStructure row as seen by the structure/field path
#[derive(Debug, Clone, PartialEq)]
pub struct StructureRow {
    pub eng_name: String,
    pub source_partition: i64,
    pub channel: Option<i64>,
}

/// DataStructure row as seen by the equipment-list path
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentStructureRow {
    pub eng_name: String,
    pub source_equipment: i64,
    pub channel: Option<i64>,
    pub monitor_point: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub name: String,
    pub ref_eng_name: Option<String>,
    pub size: i64,
    pub offset: i64,
    pub type_id: Option<i64>,
    pub source_partition: i64,
    pub structure_id: i64,
    pub unit_id: Option<i64>,
    pub description: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub low_bit: Option<i64>,
    pub high_bit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRow {
    pub id: i64,
    pub equipment: i64,
    pub module: i64,
    pub direction: i64,
    pub data_structure: Option<i64>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArincParameterRow {
    pub parameter_field_id: i64,
    pub label: i64,
    pub name: String,
    pub description: Option<String>,
    pub type_id: Option<i64>,
    pub offset: i64,
    pub length: i64,
    pub unit_id: Option<i64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub scale_factor: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArincDiscreteRow {
    pub parameter_field_id: i64,
    pub label: i64,
    pub offset: i64,
    pub value: i64,
    pub name: String,
}
