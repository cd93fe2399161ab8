pub mod bank_csv;
