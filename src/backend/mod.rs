pub mod cpu_backend;
