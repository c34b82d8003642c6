use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{loan, user};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(User::table())
                    .if_not_exists()
                    .col(pk_auto(User::column(user::Column::Id)))
                    .col(string(User::column(user::Column::FirstName)))
                    .col(string(User::column(user::Column::LastName)))
                    .col(string(User::column(user::Column::Username)).unique_key())
                    .col(integer(User::column(user::Column::Age)))
                    .col(decimal(User::column(user::Column::Salary)).decimal_len(16, 4))
                    .col(boolean(User::column(user::Column::IsBlocked)).default(false))
                    .col(string(User::column(user::Column::PasswordHash)))
                    .col(string(User::column(user::Column::Role)).string_len(20))
                    .to_owned(),
            )
            .await?;

        // Create loans table
        manager
            .create_table(
                Table::create()
                    .table(Loan::table())
                    .if_not_exists()
                    .col(pk_auto(Loan::column(loan::Column::Id)))
                    .col(string(Loan::column(loan::Column::LoanType)).string_len(20))
                    .col(decimal(Loan::column(loan::Column::Amount)).decimal_len(16, 4))
                    .col(string(Loan::column(loan::Column::Currency)).string_len(3))
                    .col(integer(Loan::column(loan::Column::LoanPeriod)))
                    .col(
                        string(Loan::column(loan::Column::Status))
                            .string_len(20)
                            .default("InProgress"),
                    )
                    .col(integer(Loan::column(loan::Column::UserId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loans_user")
                            .from(Loan::table(), Loan::column(loan::Column::UserId))
                            .to(User::table(), User::column(user::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Loans are listed per owner
        manager
            .create_index(
                Index::create()
                    .name("idx_loans_user_id")
                    .table(Loan::table())
                    .col(Loan::column(loan::Column::UserId))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Loan::table()).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::table()).to_owned())
            .await?;

        Ok(())
    }
}
