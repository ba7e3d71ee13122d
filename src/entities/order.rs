use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub customer_id: i32,
    pub status: Status,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Customer,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle. A `Pending` order is the customer's cart.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "status_enum",
    db_type = "String(StringLen::N(32))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl Status {
    /// Pending only moves through checkout; Processing fans out to the
    /// administrative states, which are terminal.
    pub fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Processing)
                | (Status::Processing, Status::Shipped)
                | (Status::Processing, Status::Delivered)
                | (Status::Processing, Status::Cancelled)
        )
    }

    /// Transitions an administrator may apply. Leaving `Pending` belongs to
    /// checkout alone.
    pub fn admin_can_transition_to(self, next: Status) -> bool {
        self != Status::Pending && self.can_transition_to(next)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        f.write_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Status;

    #[test]
    fn checkout_is_the_only_way_out_of_pending() {
        assert!(Status::Pending.can_transition_to(Status::Processing));
        assert!(!Status::Pending.can_transition_to(Status::Shipped));
        assert!(!Status::Pending.can_transition_to(Status::Cancelled));
    }

    #[test]
    fn terminal_states_stay_put() {
        for terminal in [Status::Shipped, Status::Delivered, Status::Cancelled] {
            assert!(!terminal.can_transition_to(Status::Pending));
            assert!(!terminal.can_transition_to(Status::Processing));
            assert!(!terminal.can_transition_to(Status::Delivered));
        }
        assert!(Status::Processing.can_transition_to(Status::Cancelled));
    }

    #[test]
    fn admins_cannot_check_out_a_cart() {
        assert!(!Status::Pending.admin_can_transition_to(Status::Processing));
        assert!(!Status::Pending.admin_can_transition_to(Status::Cancelled));
        assert!(Status::Processing.admin_can_transition_to(Status::Shipped));
        assert!(Status::Processing.admin_can_transition_to(Status::Cancelled));
        assert!(!Status::Shipped.admin_can_transition_to(Status::Delivered));
    }

    #[test]
    fn status_parses_its_own_display() {
        assert_eq!("shipped".parse::<Status>(), Ok(Status::Shipped));
        assert_eq!(Status::Cancelled.to_string(), "cancelled");
        assert!("Waiting".parse::<Status>().is_err());
    }
}
