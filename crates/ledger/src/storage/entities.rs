/// localStorage 키/값 엔티티 모듈
pub mod local_storage {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "local_storage")]
    pub struct Model {
        /// 저장 키
        #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
        pub key: String,

        /// 원본 문자열 값 (대부분 JSON)
        #[sea_orm(column_type = "Text")]
        pub value: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
