use indexmap::IndexMap;
use linkseed_core::schema::types::*;

/// User / Group / GroupMembership: a membership references both parents.
///
/// The user side is referenced through the `user_uuid` alias, the group side
/// through a qualified name.
pub fn membership_schema() -> Schema {
    let mut schema = Schema::new("membership");

    schema.add_entity(
        Entity::new("User", "User")
            .with_attribute(Attribute::new("uuid").unique().with_alias("user_uuid"))
            .with_attribute(Attribute::new("email").unique())
            .with_attribute(Attribute::new("name")),
    );
    schema.add_entity(
        Entity::new("Group", "Group")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("title")),
    );
    schema.add_entity(
        Entity::new("GroupMembership", "GroupMembership")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("userUuid"))
            .with_attribute(Attribute::new("groupId"))
            .with_attribute(Attribute::new("joinedAt").with_type(DataType::DateTime)),
    );

    schema.add_relationship(Relationship::new(
        "membership_user",
        "GroupMembership.userUuid",
        "user_uuid",
    ));
    schema.add_relationship(Relationship::new(
        "membership_group",
        "GroupMembership.groupId",
        "Group.id",
    ));

    schema
}

/// Assignment references User twice, through two different columns.
pub fn assignment_schema() -> Schema {
    let mut schema = Schema::new("assignments");

    schema.add_entity(
        Entity::new("User", "User")
            .with_attribute(Attribute::new("uuid").unique())
            .with_attribute(Attribute::new("name")),
    );
    schema.add_entity(
        Entity::new("Assignment", "work/Assignment")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("assignedToUUID"))
            .with_attribute(Attribute::new("createdByUUID"))
            .with_attribute(Attribute::new("title")),
    );

    schema.add_relationship(Relationship::new(
        "assigned_to",
        "work/Assignment.assignedToUUID",
        "User.uuid",
    ));
    schema.add_relationship(Relationship::new(
        "created_by",
        "work/Assignment.createdByUUID",
        "User.uuid",
    ));

    schema
}

/// Profile and User point at each other through a unique pair, declared in
/// both directions.
pub fn profile_schema() -> Schema {
    let mut schema = Schema::new("profiles");

    schema.add_entity(
        Entity::new("User", "User")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("email").unique()),
    );
    schema.add_entity(
        Entity::new("Profile", "Profile")
            .with_attribute(Attribute::new("userId").unique())
            .with_attribute(Attribute::new("bio")),
    );

    schema.add_relationship(Relationship::new("profile_user", "Profile.userId", "User.id"));
    schema.add_relationship(Relationship::new("user_profile", "User.id", "Profile.userId"));

    schema
}

/// User / Profile as a bidirectional unique pair, plus an Audit log that
/// references the user key.
pub fn audit_schema() -> Schema {
    let mut schema = Schema::new("audit");

    schema.add_entity(
        Entity::new("User", "User")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("email").unique()),
    );
    schema.add_entity(
        Entity::new("Profile", "Profile")
            .with_attribute(Attribute::new("userId").unique())
            .with_attribute(Attribute::new("bio")),
    );
    schema.add_entity(
        Entity::new("Audit", "Audit")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("userId"))
            .with_attribute(Attribute::new("at").with_type(DataType::DateTime)),
    );

    schema.add_relationship(Relationship::new("profile_user", "Profile.userId", "User.id"));
    schema.add_relationship(Relationship::new("user_profile", "User.id", "Profile.userId"));
    schema.add_relationship(Relationship::new("audit_user", "Audit.userId", "User.id"));

    schema
}

/// Customer → Order and Customer → Review, both declared from the "one" side.
pub fn storefront_schema() -> Schema {
    let mut schema = Schema::new("storefront");

    schema.add_entity(
        Entity::new("Customer", "Customer")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("email").unique()),
    );
    schema.add_entity(
        Entity::new("Order", "Order")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("customerId")),
    );
    schema.add_entity(
        Entity::new("Review", "Review")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("customerId")),
    );

    schema.add_relationship(Relationship::new(
        "customer_orders",
        "Customer.id",
        "Order.customerId",
    ));
    schema.add_relationship(Relationship::new(
        "customer_reviews",
        "Customer.id",
        "Review.customerId",
    ));

    schema
}

/// Customer → Order declared from the "one" side, plus OrderLine → Order.
pub fn commerce_schema() -> Schema {
    let mut schema = Schema::new("commerce");

    schema.add_entity(
        Entity::new("Customer", "Customer")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("email").unique())
            .with_attribute(Attribute::new("fullName")),
    );
    schema.add_entity(
        Entity::new("Order", "Order")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("customerId"))
            .with_attribute(Attribute::new("total").with_type(DataType::Decimal)),
    );
    schema.add_entity(
        Entity::new("OrderLine", "OrderLine")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("orderId"))
            .with_attribute(Attribute::new("quantity").with_type(DataType::Integer)),
    );

    schema.add_relationship(Relationship::new(
        "customer_orders",
        "Customer.id",
        "Order.customerId",
    ));
    schema.add_relationship(Relationship::new("line_order", "OrderLine.orderId", "Order.id"));

    schema
}

/// The assignment schema as it arrives from a JSON schema loader.
pub const ASSIGNMENT_SCHEMA_JSON: &str = r#"{
  "name": "assignments",
  "entities": {
    "User": {
      "id": "User",
      "externalId": "User",
      "name": "User",
      "attributes": [
        { "name": "UUID", "externalId": "uuid", "isUnique": true, "dataType": "Uuid" },
        { "name": "Name", "externalId": "name" }
      ]
    },
    "Assignment": {
      "id": "Assignment",
      "externalId": "work/Assignment",
      "name": "Assignment",
      "attributes": [
        { "name": "ID", "externalId": "id", "isUnique": true },
        { "name": "Assigned To", "externalId": "assignedToUUID" },
        { "name": "Created By", "externalId": "createdByUUID" },
        { "name": "Title", "externalId": "title" }
      ]
    }
  },
  "relationships": {
    "assigned_to": {
      "id": "assigned_to",
      "fromAttribute": "work/Assignment.assignedToUUID",
      "toAttribute": "User.uuid"
    },
    "created_by": {
      "id": "created_by",
      "fromAttribute": "work/Assignment.createdByUUID",
      "toAttribute": "User.uuid"
    },
    "assignee_team": {
      "id": "assignee_team",
      "fromAttribute": "work/Assignment.assignedToUUID",
      "toAttribute": "Team.id",
      "path": ["User", "Team"]
    }
  }
}"#;

/// Parse a schema from its JSON form.
pub fn schema_from_json(json: &str) -> Schema {
    serde_json::from_str(json).expect("fixture schema JSON must parse")
}

/// Build a table from literal headers and rows.
pub fn table(headers: &[&str], rows: &[&[&str]]) -> EntityTable {
    EntityTable {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}

/// Collect `(entity id, table)` pairs into a dataset.
pub fn dataset(tables: Vec<(&str, EntityTable)>) -> IndexMap<String, EntityTable> {
    tables
        .into_iter()
        .map(|(id, table)| (id.to_string(), table))
        .collect()
}
