pub mod habit_service_impl;
