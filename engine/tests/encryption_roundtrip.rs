use std::fs;
use std::io::Write;
use std::path::Path;

use streamseal::{AeadAlgorithm, Engine, EngineConfig, KdfLimits, KdfParams, StreamSealError};
use tempfile::tempdir;

fn fast_engine() -> Engine {
    let config = EngineConfig::default()
        .with_chunk_size(1024)
        .with_kdf(KdfParams::argon2id(256, 1, 1))
        .with_kdf_limits(KdfLimits {
            min_mem_cost_kib: 64,
            min_time_cost: 1,
            min_parallelism: 1,
            max_mem_cost_kib: 4096,
            max_time_cost: 4,
            max_parallelism: 4,
        });
    Engine::new(config).expect("fast config is valid")
}

fn write_input(path: &Path, contents: &[u8]) {
    let mut input_file = fs::File::create(path).expect("create input");
    input_file.write_all(contents).expect("write plaintext");
}

#[test]
fn encrypt_decrypt_roundtrip() {
    // 默认模式（XChaCha20-Poly1305）加密后再解密能够恢复原始内容，且跨越多个 chunk。
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("output.sseal");
    let decrypted_path = temp_dir.path().join("decrypted.txt");

    let plaintext: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    write_input(&input_path, &plaintext);

    let engine = fast_engine();
    engine
        .encrypt_file(&input_path, &encrypted_path, "test-password")
        .expect("encrypt file");
    let written = engine
        .decrypt_file(&encrypted_path, &decrypted_path, "test-password")
        .expect("decrypt file");

    assert_eq!(written, plaintext.len() as u64);
    let decrypted = fs::read(&decrypted_path).expect("read decrypted");
    assert_eq!(decrypted, plaintext);
}

#[test]
fn encrypt_decrypt_roundtrip_with_aes_256_gcm() {
    // AES-256-GCM 模式也能完成端到端 round-trip，算法由容器头决定。
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("output_aes.sseal");
    let decrypted_path = temp_dir.path().join("decrypted.txt");

    let plaintext = b"streamseal aes mode payload";
    write_input(&input_path, plaintext);

    let aes_engine = Engine::new(
        fast_engine()
            .config()
            .clone()
            .with_algorithm(AeadAlgorithm::Aes256Gcm),
    )
    .expect("aes config is valid");
    aes_engine
        .encrypt_file(&input_path, &encrypted_path, "test-password")
        .expect("encrypt file with aes");

    let container = fs::read(&encrypted_path).expect("read container");
    assert_eq!(container[9], AeadAlgorithm::AES_256_GCM_ID);

    // 解密端使用默认算法配置，仍按容器头中的算法解密
    fast_engine()
        .decrypt_file(&encrypted_path, &decrypted_path, "test-password")
        .expect("decrypt file");

    let decrypted = fs::read(&decrypted_path).expect("read decrypted");
    assert_eq!(decrypted, plaintext);
}

#[test]
fn empty_file_roundtrip() {
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("empty.txt");
    let encrypted_path = temp_dir.path().join("empty.sseal");
    let decrypted_path = temp_dir.path().join("empty.out");

    write_input(&input_path, b"");

    let engine = fast_engine();
    engine
        .encrypt_file(&input_path, &encrypted_path, "pw")
        .expect("encrypt empty file");
    engine
        .decrypt_file(&encrypted_path, &decrypted_path, "pw")
        .expect("decrypt empty file");

    assert!(fs::read(&decrypted_path).expect("read decrypted").is_empty());
}

#[test]
fn decrypt_with_wrong_password_fails() {
    // 错误密码必须导致认证失败，且不留下输出文件。
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("output.sseal");
    let decrypted_path = temp_dir.path().join("decrypted.txt");

    write_input(&input_path, b"streamseal auth fail");

    let engine = fast_engine();
    engine
        .encrypt_file(&input_path, &encrypted_path, "correct-password")
        .expect("encrypt file");

    let result = engine.decrypt_file(&encrypted_path, &decrypted_path, "wrong-password");
    assert!(
        matches!(result, Err(StreamSealError::Authentication)),
        "expected authentication failure, got {result:?}"
    );
    assert!(!decrypted_path.exists(), "no plaintext must be materialized");
}

#[test]
fn failed_decrypt_keeps_existing_output() {
    // 截断的容器解密失败时，目标路径上已有的文件保持原样。
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("output.sseal");
    let decrypted_path = temp_dir.path().join("decrypted.txt");

    write_input(&input_path, &vec![7u8; 3000]);
    fs::write(&decrypted_path, b"previous contents").expect("write previous output");

    let engine = fast_engine();
    engine
        .encrypt_file(&input_path, &encrypted_path, "pw")
        .expect("encrypt file");

    let container = fs::read(&encrypted_path).expect("read container");
    fs::write(&encrypted_path, &container[..container.len() - 30]).expect("truncate container");

    let result = engine.decrypt_file(&encrypted_path, &decrypted_path, "pw");
    assert!(matches!(result, Err(StreamSealError::TruncatedContainer)));
    assert_eq!(
        fs::read(&decrypted_path).expect("read previous output"),
        b"previous contents"
    );
}

#[test]
fn decrypt_rejects_invalid_header_magic() {
    // Header magic 不匹配时应立即拒绝解析。
    let temp_dir = tempdir().expect("create temp dir");
    let bad_path = temp_dir.path().join("bad.sseal");
    let output_path = temp_dir.path().join("output.txt");

    fs::write(&bad_path, b"not a streamseal container, just some bytes here")
        .expect("write bad file");

    let result = fast_engine().decrypt_file(&bad_path, &output_path, "password");
    assert!(matches!(result, Err(StreamSealError::MalformedContainer(_))));
    assert!(!output_path.exists());
}

#[test]
fn empty_password_is_rejected() {
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("output.sseal");

    write_input(&input_path, b"data");

    let result = fast_engine().encrypt_file(&input_path, &encrypted_path, "");
    assert!(matches!(result, Err(StreamSealError::EmptySecret)));
    assert!(!encrypted_path.exists());
}

#[test]
fn default_engine_refuses_weak_container() {
    // 低成本 KDF 参数写出的容器，默认配置（较高下限）拒绝解密。
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("weak.sseal");
    let decrypted_path = temp_dir.path().join("decrypted.txt");

    write_input(&input_path, b"weak kdf");
    fast_engine()
        .encrypt_file(&input_path, &encrypted_path, "pw")
        .expect("encrypt file");

    let result = streamseal::decrypt(&encrypted_path, &decrypted_path, "pw");
    assert!(matches!(result, Err(StreamSealError::WeakParameter(_))));
}

#[test]
fn config_file_drives_engine() {
    let temp_dir = tempdir().expect("create temp dir");
    let config_path = temp_dir.path().join("streamseal.toml");

    fs::write(
        &config_path,
        r#"
        algorithm = "aes-256-gcm"
        chunk_size = 512

        [kdf]
        mem_cost_kib = 256
        time_cost = 1

        [kdf_limits]
        min_mem_cost_kib = 64
        min_time_cost = 1
        "#,
    )
    .expect("write config");

    let config = EngineConfig::load(&config_path).expect("load config");
    assert_eq!(config.algorithm, AeadAlgorithm::Aes256Gcm);
    assert_eq!(config.chunk_size, 512);

    let engine = Engine::new(config).expect("engine from config");
    let mut container = Vec::new();
    engine
        .encrypt("pw", &b"configured"[..], &mut container)
        .expect("encrypt with config");

    let mut plaintext = Vec::new();
    engine
        .decrypt("pw", container.as_slice(), &mut plaintext)
        .expect("decrypt with config");
    assert_eq!(plaintext, b"configured");
}

#[test]
fn default_path_functions_roundtrip() {
    // 默认配置的路径接口（CLI 之外的最简用法）
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("output.sseal");
    let decrypted_path = temp_dir.path().join("decrypted.txt");

    write_input(&input_path, b"default path functions");

    streamseal::encrypt(&input_path, &encrypted_path, "pw").expect("encrypt file");
    streamseal::decrypt(&encrypted_path, &decrypted_path, "pw").expect("decrypt file");

    let decrypted = fs::read(&decrypted_path).expect("read decrypted");
    assert_eq!(decrypted, b"default path functions");
}
