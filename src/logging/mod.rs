pub mod ladder_audit;
