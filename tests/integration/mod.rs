// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod crawl_test;
pub mod fetcher_test;
pub mod helpers;
pub mod pipeline_test;
pub mod providers_test;
pub mod rest_store_test;
pub mod routes_test;
pub mod webhook_test;
pub mod worker_test;
