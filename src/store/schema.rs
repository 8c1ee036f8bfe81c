//! Table catalog. Every identifier that ends up in a query comes from here.

use crate::error::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    Integer,
    Boolean,
    Jsonb,
    Timestamptz,
}

impl ColumnType {
    /// PostgreSQL type used to cast text parameters.
    pub fn pg_name(self) -> &'static str {
        match self {
            ColumnType::Uuid => "uuid",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Jsonb => "jsonb",
            ColumnType::Timestamptz => "timestamptz",
        }
    }
}

/// Value a column takes when an insert leaves it out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnDefault {
    RandomUuid,
    Now,
    Text(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub default: Option<ColumnDefault>,
    /// Foreign key to the `id` column of another table.
    pub references: Option<Table>,
}

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty, default: None, references: None }
}

const ID: Column = Column {
    name: "id",
    ty: ColumnType::Uuid,
    default: Some(ColumnDefault::RandomUuid),
    references: None,
};

const CREATED_AT: Column = Column {
    name: "created_at",
    ty: ColumnType::Timestamptz,
    default: Some(ColumnDefault::Now),
    references: None,
};

const fn fk(name: &'static str, table: Table) -> Column {
    Column { name, ty: ColumnType::Uuid, default: None, references: Some(table) }
}

const PETS: &[Column] = &[
    ID,
    col("name", ColumnType::Text),
    col("species", ColumnType::Text),
    col("breed", ColumnType::Text),
    col("size", ColumnType::Text),
    col("energy", ColumnType::Text),
    col("age", ColumnType::Integer),
    col("good_with_kids", ColumnType::Boolean),
    col("good_with_pets", ColumnType::Boolean),
    col("temperament", ColumnType::Text),
    col("description", ColumnType::Text),
    col("attributes", ColumnType::Jsonb),
    CREATED_AT,
];

const PET_IMAGES: &[Column] = &[ID, fk("pet_id", Table::Pets), col("image_url", ColumnType::Text), CREATED_AT];

const FAVORITES: &[Column] = &[
    ID,
    col("user_id", ColumnType::Text),
    fk("pet_id", Table::Pets),
    col("note", ColumnType::Text),
    CREATED_AT,
];

const ADOPTION_REQUESTS: &[Column] = &[
    ID,
    col("user_id", ColumnType::Text),
    fk("pet_id", Table::Pets),
    col("message", ColumnType::Text),
    Column {
        name: "status",
        ty: ColumnType::Text,
        default: Some(ColumnDefault::Text("pending")),
        references: None,
    },
    CREATED_AT,
];

const TAGS: &[Column] = &[ID, col("name", ColumnType::Text), CREATED_AT];

const PET_TAGS: &[Column] = &[ID, fk("pet_id", Table::Pets), fk("tag_id", Table::Tags), CREATED_AT];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Pets,
    PetImages,
    Favorites,
    AdoptionRequests,
    Tags,
    PetTags,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Pets,
        Table::PetImages,
        Table::Favorites,
        Table::AdoptionRequests,
        Table::Tags,
        Table::PetTags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Pets => "pets",
            Table::PetImages => "pet_images",
            Table::Favorites => "favorites",
            Table::AdoptionRequests => "adoption_requests",
            Table::Tags => "tags",
            Table::PetTags => "pet_tags",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Table::Pets => PETS,
            Table::PetImages => PET_IMAGES,
            Table::Favorites => FAVORITES,
            Table::AdoptionRequests => ADOPTION_REQUESTS,
            Table::Tags => TAGS,
            Table::PetTags => PET_TAGS,
        }
    }

    pub fn column(self, name: &str) -> Result<&'static Column, StoreError> {
        self.columns()
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::UnknownColumn { table: self.name(), column: name.to_string() })
    }

    /// Column of `self` holding a foreign key to `target`.
    pub fn reference_to(self, target: Table) -> Result<&'static Column, StoreError> {
        self.columns()
            .iter()
            .find(|c| c.references == Some(target))
            .ok_or(StoreError::NoRelationship { from: self.name(), to: target.name() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_has_uuid_id() {
        for t in Table::ALL {
            let id = t.column("id").unwrap();
            assert_eq!(id.ty, ColumnType::Uuid);
            assert_eq!(id.default, Some(ColumnDefault::RandomUuid));
        }
    }

    #[test]
    fn references_resolve_join_columns() {
        assert_eq!(Table::Favorites.reference_to(Table::Pets).unwrap().name, "pet_id");
        assert_eq!(Table::PetTags.reference_to(Table::Tags).unwrap().name, "tag_id");
        assert!(matches!(
            Table::Tags.reference_to(Table::Pets),
            Err(StoreError::NoRelationship { from: "tags", to: "pets" })
        ));
    }

    #[test]
    fn unknown_column_names_the_table() {
        let err = Table::Pets.column("colour").unwrap_err();
        assert_eq!(err.to_string(), "column pets.colour does not exist");
    }
}
