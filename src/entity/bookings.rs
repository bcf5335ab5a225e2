use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub booking_code: String,
    pub tour_id: Uuid,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub tour_date: Date,
    pub number_of_guests: i32,
    pub requested_guide_id: Option<Uuid>,
    pub assigned_guide_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub payment_transaction_id: Option<String>,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub total_amount: i64,
    pub special_requests: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tours::Entity",
        from = "Column::TourId",
        to = "super::tours::Column::Id"
    )]
    Tours,
    #[sea_orm(
        belongs_to = "super::guides::Entity",
        from = "Column::AssignedGuideId",
        to = "super::guides::Column::Id"
    )]
    Guides,
}

impl Related<super::tours::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tours.def()
    }
}

impl Related<super::guides::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
