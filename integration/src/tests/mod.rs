//! Integration tests for the deployment scripts
