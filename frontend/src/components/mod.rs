pub mod balance_header;
pub mod bottom_sheet;
pub mod category_grid;
pub mod day_sheet;
pub mod quick_add_sheet;
pub mod summary_sheet;
pub mod transaction_form;
pub mod transaction_list;
