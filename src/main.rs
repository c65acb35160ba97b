// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use harvestrs::config::settings::Settings;
use harvestrs::domain::models::outcome::RunOutcome;
use harvestrs::infrastructure::metrics;
use harvestrs::utils::telemetry;
use harvestrs::workers::PipelineManager;
use std::process::ExitCode;
use tracing::{error, info};

/// 运行被认证失败终止时的退出码
const EXIT_ABORTED: u8 = 2;

/// 主函数
///
/// 初始化日志、配置和各组件，执行一次完整的抓取运行
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting harvestrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded, API base URL {}", settings.api.base_url);

    metrics::init_metrics(&settings.metrics);

    // 3. Initialize components
    let manager = PipelineManager::from_settings(&settings)?;

    // 4. Run the pipeline
    match manager.run().await? {
        RunOutcome::Completed(reports) => {
            let stored: usize = reports.iter().map(|r| r.stored).sum();
            info!("Run completed: {} stages, {} records stored", reports.len(), stored);
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Aborted { stage, reason, .. } => {
            error!("Run aborted during stage {}: {}", stage, reason);
            Ok(ExitCode::from(EXIT_ABORTED))
        }
    }
}
